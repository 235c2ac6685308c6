//! CSV loading for race cards with past-five performance columns
//!
//! The crawler writes one row per starter in wide format. Two header schemas are
//! recognised: the crawler's Japanese headers (`馬名`, `1走前_距離`, ...) and an
//! English equivalent (`name`, `past1_distance`, ...).

use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

use crate::data::parser::read_text_file;
use crate::error::{Result, ScoringError};
use crate::models::{HorseEntry, PastRaceRecord, MAX_PAST_RACES};

/// Fields carried for each past race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PastField {
    Venue,
    Distance,
    Going,
    Passage,
    Time,
    Closing,
    Pace,
}

impl PastField {
    pub const ALL: [PastField; 7] = [
        PastField::Venue,
        PastField::Distance,
        PastField::Going,
        PastField::Passage,
        PastField::Time,
        PastField::Closing,
        PastField::Pace,
    ];

    fn japanese(&self) -> &'static str {
        match self {
            PastField::Venue => "開催",
            PastField::Distance => "距離",
            PastField::Going => "馬場",
            PastField::Passage => "通過",
            PastField::Time => "タイム",
            PastField::Closing => "上り",
            PastField::Pace => "ペース",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            PastField::Venue => "venue",
            PastField::Distance => "distance",
            PastField::Going => "going",
            PastField::Passage => "passage",
            PastField::Time => "time",
            PastField::Closing => "closing",
            PastField::Pace => "pace",
        }
    }
}

/// Column naming scheme of an entry table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSchema {
    /// Headers written by the race-card crawler
    Netkeiba,
    English,
}

impl TableSchema {
    /// Detect the schema from the name column
    pub fn detect(df: &DataFrame) -> Result<Self> {
        if df.column("馬名").is_ok() {
            Ok(TableSchema::Netkeiba)
        } else if df.column("name").is_ok() {
            Ok(TableSchema::English)
        } else {
            Err(ScoringError::MissingColumn("馬名 / name".to_string()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableSchema::Netkeiba => "馬名",
            TableSchema::English => "name",
        }
    }

    pub fn frame(&self) -> &'static str {
        match self {
            TableSchema::Netkeiba => "枠番",
            TableSchema::English => "frame",
        }
    }

    pub fn horse_no(&self) -> &'static str {
        match self {
            TableSchema::Netkeiba => "馬番",
            TableSchema::English => "horse_no",
        }
    }

    pub fn odds(&self) -> &'static str {
        match self {
            TableSchema::Netkeiba => "オッズ",
            TableSchema::English => "odds",
        }
    }

    /// Column for field `field` of the `n`-th most recent race (1-based)
    pub fn past(&self, n: usize, field: PastField) -> String {
        match self {
            TableSchema::Netkeiba => format!("{}走前_{}", n, field.japanese()),
            TableSchema::English => format!("past{}_{}", n, field.english()),
        }
    }
}

/// Parse CSV text with every column kept as text
pub(crate) fn read_text_table(text: &str) -> PolarsResult<DataFrame> {
    let text = text.trim_start_matches('\u{feff}');
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()
}

/// Text column if present
pub(crate) fn text_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    df.column(name).ok().and_then(|s| s.str().ok())
}

/// Trimmed non-empty cell
pub(crate) fn cell(column: Option<&StringChunked>, row: usize) -> Option<String> {
    column
        .and_then(|c| c.get(row))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn parse_cell<T: std::str::FromStr>(column: Option<&StringChunked>, row: usize) -> Option<T> {
    cell(column, row).and_then(|s| s.parse().ok())
}

/// Race card table loaded from CSV
pub struct EntryTable {
    df: DataFrame,
    schema: TableSchema,
}

impl EntryTable {
    /// Load a race card CSV (UTF-8 with or without BOM, or CP932)
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let text = read_text_file(csv_path.as_ref())?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let df = read_text_table(text)?;
        let schema = TableSchema::detect(&df)?;

        // Drop rows without a horse name (trailing blank lines, separators)
        let df = df
            .lazy()
            .filter(col(schema.name()).is_not_null())
            .collect()?;

        Ok(Self { df, schema })
    }

    pub fn schema(&self) -> TableSchema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Convert rows to horse entries, keeping row order
    pub fn entries(&self) -> Result<Vec<HorseEntry>> {
        let schema = self.schema;
        let df = &self.df;

        let name_col = df.column(schema.name())?.str()?;
        let frame_col = text_column(df, schema.frame());
        let horse_no_col = text_column(df, schema.horse_no());
        let odds_col = text_column(df, schema.odds());

        // past_cols[n][field]
        let past_cols: Vec<Vec<Option<&StringChunked>>> = (1..=MAX_PAST_RACES)
            .map(|n| {
                PastField::ALL
                    .iter()
                    .map(|f| text_column(df, &schema.past(n, *f)))
                    .collect()
            })
            .collect();

        let mut entries = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let name = cell(Some(name_col), i).unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            let past_races = past_cols
                .iter()
                .map(|cols| PastRaceRecord {
                    venue: cell(cols[0], i),
                    distance: cell(cols[1], i),
                    track_condition: cell(cols[2], i),
                    passage: cell(cols[3], i),
                    time: cell(cols[4], i),
                    closing: cell(cols[5], i),
                    pace: cell(cols[6], i),
                })
                .collect();

            entries.push(
                HorseEntry::new(name)
                    .with_post(parse_cell(frame_col, i), parse_cell(horse_no_col, i))
                    .with_odds(parse_cell::<f64>(odds_col, i).filter(|o| o.is_finite()))
                    .with_past_races(past_races),
            );
        }

        Ok(entries)
    }
}

/// Load horse entries from a race card CSV
pub fn load_entries<P: AsRef<Path>>(csv_path: P) -> Result<Vec<HorseEntry>> {
    EntryTable::load(csv_path)?.entries()
}
