//! Actual race results for model evaluation

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::csv_loader::{cell, parse_cell, read_text_table, text_column};
use crate::data::parser::read_text_file;
use crate::error::{Result, ScoringError};

/// Finishing record of one horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResultRow {
    pub name: String,
    /// `None` for scratches, disqualifications and non-finishers
    pub finish: Option<u32>,
    /// Betting popularity rank (1 = favourite)
    pub popularity: Option<u32>,
    pub odds: Option<f64>,
}

/// Load a result table (`馬名,着順,人気,オッズ` or `name,finish,popularity,odds`)
pub fn load_results<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RaceResultRow>> {
    let text = read_text_file(csv_path.as_ref())?;
    results_from_text(&text)
}

pub fn results_from_text(text: &str) -> Result<Vec<RaceResultRow>> {
    let df = read_text_table(text)?;

    let (name, finish, popularity, odds) = if df.column("馬名").is_ok() {
        ("馬名", "着順", "人気", "オッズ")
    } else if df.column("name").is_ok() {
        ("name", "finish", "popularity", "odds")
    } else {
        return Err(ScoringError::MissingColumn("馬名 / name".to_string()));
    };

    let name_col = text_column(&df, name);
    let finish_col = text_column(&df, finish);
    let popularity_col = text_column(&df, popularity);
    let odds_col = text_column(&df, odds);

    let rows = (0..df.height())
        .filter_map(|i| {
            Some(RaceResultRow {
                name: cell(name_col, i)?,
                finish: parse_cell(finish_col, i),
                popularity: parse_cell(popularity_col, i),
                odds: parse_cell::<f64>(odds_col, i).filter(|o| o.is_finite()),
            })
        })
        .collect();

    Ok(rows)
}
