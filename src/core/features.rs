//! Past-five feature aggregation
//!
//! Turns each horse's past-race records into three raw ability scalars:
//! speed (distance-normalized time), closing (final-section time) and lead
//! (early position).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringConfig;
use crate::core::deviation::round_to;
use crate::core::normalizer::convert_distance_time;
use crate::data::parser::{
    detect_surface, parse_closing_time, parse_distance, parse_elapsed_time, parse_lead_position,
    parse_pace,
};
use crate::models::{HorseEntry, PastRaceRecord, RawScoreTriple, SampleCounts, MAX_PAST_RACES};

/// Speed is reported as 200 − mean time so that higher is better
const SPEED_BASE: f64 = 200.0;
/// Closing is reported as 60 − closing time
const CLOSING_BASE: f64 = 60.0;
/// Decimal places kept on raw scalars
const RAW_DECIMALS: i32 = 4;

/// Contributions of a single past race
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordEvaluation {
    /// Time converted to the target distance (seconds)
    pub adjusted_time: Option<f64>,
    pub closing: Option<f64>,
    /// Early-position fraction, pace-corrected and clipped to [0, 1]
    pub lead: Option<f64>,
}

/// Raw features for one horse
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorseFeatures {
    pub raw: RawScoreTriple,
    pub samples: SampleCounts,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Feature aggregation for race entries
pub struct FeatureAggregator;

impl FeatureAggregator {
    /// Evaluate one past race against the target race.
    ///
    /// Speed and closing only count on the target surface; lead is treated as
    /// surface-independent.
    pub fn evaluate_record(record: &PastRaceRecord, config: &ScoringConfig) -> RecordEvaluation {
        let mut eval = RecordEvaluation::default();
        let pace = parse_pace(record.pace.as_deref());
        let surface = detect_surface(record.distance.as_deref());

        if let Some(surface) = surface.filter(|s| *s == config.target_surface) {
            let distance = parse_distance(record.distance.as_deref()).filter(|&d| d > 0);
            let elapsed = parse_elapsed_time(record.time.as_deref()).filter(|&t| t > 0.0);

            eval.adjusted_time = convert_distance_time(
                elapsed,
                distance,
                Some(config.target_distance),
                surface,
                &config.distance_adjustment,
            )
            .filter(|&t| t != 0.0);

            eval.closing = parse_closing_time(record.closing.as_deref())
                .map(|c| CLOSING_BASE - c + config.closing_pace.correction(pace));
        }

        eval.lead = parse_lead_position(record.passage.as_deref(), config.field_size)
            .map(|p| (p + config.lead_pace.correction(pace)).clamp(0.0, 1.0));

        eval
    }

    /// Aggregate a horse's past races into raw scalars
    pub fn aggregate(horse: &HorseEntry, config: &ScoringConfig) -> HorseFeatures {
        let mut times = Vec::new();
        let mut closings = Vec::new();
        let mut leads = Vec::new();

        for record in horse.past_races().iter().take(MAX_PAST_RACES) {
            let eval = Self::evaluate_record(record, config);
            times.extend(eval.adjusted_time);
            closings.extend(eval.closing);
            leads.extend(eval.lead);
        }

        let raw = RawScoreTriple {
            speed: mean(&times).map(|t| round_to(SPEED_BASE - t, RAW_DECIMALS)),
            closing: mean(&closings).map(|c| round_to(c, RAW_DECIMALS)),
            lead: mean(&leads).map(|l| round_to(l, RAW_DECIMALS)),
        };
        let samples = SampleCounts {
            speed: times.len(),
            closing: closings.len(),
            lead: leads.len(),
        };

        debug!(
            "{}: speed {:?} ({}), closing {:?} ({}), lead {:?} ({})",
            horse.name,
            raw.speed,
            samples.speed,
            raw.closing,
            samples.closing,
            raw.lead,
            samples.lead
        );

        HorseFeatures { raw, samples }
    }

    /// Aggregate every horse in the field, preserving order
    pub fn aggregate_field(horses: &[HorseEntry], config: &ScoringConfig) -> Vec<HorseFeatures> {
        horses.iter().map(|h| Self::aggregate(h, config)).collect()
    }
}

/// Raw feature column names in output order
pub fn get_raw_feature_names() -> Vec<&'static str> {
    vec!["raw_speed", "raw_closing", "raw_lead"]
}
