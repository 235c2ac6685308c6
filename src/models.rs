use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Maximum number of past races carried per horse
pub const MAX_PAST_RACES: usize = 5;

/// Track surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Turf,
    Dirt,
}

impl Surface {
    /// Tag used in race cards and course weight keys ("芝1600", "ダ1200")
    pub fn tag(&self) -> &'static str {
        match self {
            Surface::Turf => "芝",
            Surface::Dirt => "ダ",
        }
    }

    /// Parse a surface given on the command line or in a race list
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "芝" | "turf" | "t" => Some(Surface::Turf),
            "ダ" | "ダート" | "砂" | "dirt" | "d" => Some(Surface::Dirt),
            _ => None,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Turf => write!(f, "turf"),
            Surface::Dirt => write!(f, "dirt"),
        }
    }
}

/// Early-pace classification of a past race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaceCategory {
    Fast,
    Even,
    Slow,
    /// Unrecognised or missing pace text; carries no correction
    #[default]
    Unknown,
}

/// One historical race run by one horse, as raw text from the race card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastRaceRecord {
    pub venue: Option<String>,
    /// Surface tag + meters, e.g. "芝1600"
    pub distance: Option<String>,
    pub track_condition: Option<String>,
    /// Corner passage positions, e.g. "1-3-2-1"
    pub passage: Option<String>,
    /// Elapsed time, "M:SS.s"
    pub time: Option<String>,
    /// Closing-leg (last 600m) time in seconds
    pub closing: Option<String>,
    pub pace: Option<String>,
}

impl PastRaceRecord {
    /// True when every field of the slot is absent
    pub fn is_empty(&self) -> bool {
        self.venue.is_none()
            && self.distance.is_none()
            && self.track_condition.is_none()
            && self.passage.is_none()
            && self.time.is_none()
            && self.closing.is_none()
            && self.pace.is_none()
    }
}

/// One starter in the target race
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HorseEntry {
    pub name: String,
    pub frame: Option<u8>,
    pub horse_no: Option<u8>,
    /// Informational only, never used in scoring
    pub odds: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_past_races")]
    past_races: Vec<PastRaceRecord>,
}

/// Deserialized histories are capped like `with_past_races`
fn deserialize_past_races<'de, D>(deserializer: D) -> Result<Vec<PastRaceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut races = Vec::<PastRaceRecord>::deserialize(deserializer)?;
    races.truncate(MAX_PAST_RACES);
    Ok(races)
}

impl HorseEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_post(mut self, frame: Option<u8>, horse_no: Option<u8>) -> Self {
        self.frame = frame;
        self.horse_no = horse_no;
        self
    }

    pub fn with_odds(mut self, odds: Option<f64>) -> Self {
        self.odds = odds;
        self
    }

    /// Attach past races, most recent first. Records past the fifth are dropped.
    pub fn with_past_races(mut self, mut races: Vec<PastRaceRecord>) -> Self {
        races.truncate(MAX_PAST_RACES);
        self.past_races = races;
        self
    }

    pub fn past_races(&self) -> &[PastRaceRecord] {
        &self.past_races
    }
}

/// Raw per-horse ability scalars; `None` when no usable past race fed the metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScoreTriple {
    pub speed: Option<f64>,
    pub closing: Option<f64>,
    pub lead: Option<f64>,
}

/// Number of past races that contributed to each raw metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    pub speed: usize,
    pub closing: usize,
    pub lead: usize,
}

/// Field-relative deviation scores (50-centered, 10-scaled)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationScoreTriple {
    pub speed: f64,
    pub closing: f64,
    pub lead: f64,
}

/// Course multipliers for the three deviation scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseWeight {
    pub speed: f64,
    pub lead: f64,
    pub closing: f64,
}

/// Dense-ranked entry, index refers to the position in the scored field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub index: usize,
    pub score: f64,
    pub rank: u32,
}

/// Fully scored starter, one output row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHorse {
    pub name: String,
    pub frame: Option<u8>,
    pub horse_no: Option<u8>,
    pub odds: Option<f64>,
    pub raw: RawScoreTriple,
    pub samples: SampleCounts,
    pub deviation: DeviationScoreTriple,
    pub raw_course_score: Option<f64>,
    pub aptitude: Option<f64>,
    /// `None` for unscored horses
    pub rank: Option<u32>,
}

/// Identifies the race being scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceContext {
    pub race_id: String,
    pub course: String,
    pub surface: Surface,
    pub distance: u32,
}

/// Scored field plus ranking, in rank order for ranked horses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRace {
    pub context: RaceContext,
    pub weight: CourseWeight,
    /// Rows in input order
    pub horses: Vec<ScoredHorse>,
    pub ranking: Vec<RankedEntry>,
    /// Indices of horses with an undefined aptitude score
    pub unscored: Vec<usize>,
}

impl ScoredRace {
    /// Ranked horses, best first
    pub fn ranked_horses(&self) -> impl Iterator<Item = (&RankedEntry, &ScoredHorse)> {
        self.ranking.iter().map(move |r| (r, &self.horses[r.index]))
    }

    pub fn unscored_horses(&self) -> impl Iterator<Item = &ScoredHorse> {
        self.unscored.iter().map(move |&i| &self.horses[i])
    }
}
