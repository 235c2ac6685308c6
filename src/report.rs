//! Scored table output and text reports

use chrono::Local;
use polars::prelude::*;
use std::fmt::{self, Write as _};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::core::features::get_raw_feature_names;
use crate::error::Result;
use crate::evaluation::RaceEvaluation;
use crate::models::ScoredRace;

/// Output file name for a scored race, e.g. `race_2025_1600m_東京_course.csv`
pub fn scored_file_name(race: &ScoredRace) -> String {
    format!(
        "race_{}_{}m_{}_course.csv",
        race.context.race_id, race.context.distance, race.context.course
    )
}

/// Report file name for a scored race
pub fn report_file_name(race: &ScoredRace) -> String {
    format!(
        "report_{}_{}m_{}.txt",
        race.context.race_id, race.context.distance, race.context.course
    )
}

/// Build the output table, one row per horse in input order
pub fn scored_race_to_dataframe(race: &ScoredRace) -> PolarsResult<DataFrame> {
    let h = &race.horses;
    let names: Vec<&str> = h.iter().map(|x| x.name.as_str()).collect();
    let frames: Vec<Option<u32>> = h.iter().map(|x| x.frame.map(u32::from)).collect();
    let horse_nos: Vec<Option<u32>> = h.iter().map(|x| x.horse_no.map(u32::from)).collect();
    let odds: Vec<Option<f64>> = h.iter().map(|x| x.odds).collect();
    let raw_speed: Vec<Option<f64>> = h.iter().map(|x| x.raw.speed).collect();
    let raw_closing: Vec<Option<f64>> = h.iter().map(|x| x.raw.closing).collect();
    let raw_lead: Vec<Option<f64>> = h.iter().map(|x| x.raw.lead).collect();
    let speed_n: Vec<u32> = h.iter().map(|x| x.samples.speed as u32).collect();
    let closing_n: Vec<u32> = h.iter().map(|x| x.samples.closing as u32).collect();
    let lead_n: Vec<u32> = h.iter().map(|x| x.samples.lead as u32).collect();
    let speed_dev: Vec<f64> = h.iter().map(|x| x.deviation.speed).collect();
    let closing_dev: Vec<f64> = h.iter().map(|x| x.deviation.closing).collect();
    let lead_dev: Vec<f64> = h.iter().map(|x| x.deviation.lead).collect();
    let raw_course: Vec<Option<f64>> = h.iter().map(|x| x.raw_course_score).collect();
    let aptitude: Vec<Option<f64>> = h.iter().map(|x| x.aptitude).collect();
    let ranks: Vec<Option<u32>> = h.iter().map(|x| x.rank).collect();
    let raw_names = get_raw_feature_names();

    DataFrame::new(vec![
        Series::new("name", names),
        Series::new("frame", frames),
        Series::new("horse_no", horse_nos),
        Series::new("odds", odds),
        Series::new(raw_names[0], raw_speed),
        Series::new(raw_names[1], raw_closing),
        Series::new(raw_names[2], raw_lead),
        Series::new("speed_samples", speed_n),
        Series::new("closing_samples", closing_n),
        Series::new("lead_samples", lead_n),
        Series::new("speed_dev", speed_dev),
        Series::new("closing_dev", closing_dev),
        Series::new("lead_dev", lead_dev),
        Series::new("raw_course_score", raw_course),
        Series::new("aptitude", aptitude),
        Series::new("rank", ranks),
    ])
}

/// Write the scored table as CSV
pub fn write_scored_csv<P: AsRef<Path>>(race: &ScoredRace, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut df = scored_race_to_dataframe(race)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    info!("Wrote scored table: {:?}", path);
    Ok(())
}

fn write_ranking<W: fmt::Write>(out: &mut W, race: &ScoredRace) -> fmt::Result {
    let ctx = &race.context;

    writeln!(out, "==== Race Report ====")?;
    writeln!(out, "Race ID: {}", ctx.race_id)?;
    writeln!(out, "Distance: {}m", ctx.distance)?;
    writeln!(out, "Course: {} ({})", ctx.course, ctx.surface)?;
    writeln!(
        out,
        "Weights: speed {:.2} / lead {:.2} / closing {:.2}",
        race.weight.speed, race.weight.lead, race.weight.closing
    )?;
    writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;
    writeln!(out, "--- Model Ranking ---")?;

    for (entry, horse) in race.ranked_horses() {
        writeln!(out, "{}位 | {} | score: {:.3}", entry.rank, horse.name, entry.score)?;
    }

    let unscored: Vec<&str> = race.unscored_horses().map(|h| h.name.as_str()).collect();
    if !unscored.is_empty() {
        writeln!(out)?;
        writeln!(out, "--- Unscored ---")?;
        for name in unscored {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(())
}

/// Plain-text ranking report
pub fn render_report(race: &ScoredRace) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    write_ranking(&mut out, race).map(|()| out).unwrap_or_default()
}

/// Write the ranking report to a file
pub fn write_report<P: AsRef<Path>>(race: &ScoredRace, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_report(race))?;
    info!("Wrote report: {:?}", path);
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn write_evaluation<W: fmt::Write>(out: &mut W, evaluation: &RaceEvaluation) -> fmt::Result {
    writeln!(out, "==== Model vs Result: {} ====", evaluation.race_id)?;
    for c in &evaluation.comparisons {
        writeln!(
            out,
            "{:>2}位 | {} | score: {} | finish: {} | popularity: {} | odds: {}",
            opt(c.model_rank),
            c.name,
            c.score.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".to_string()),
            opt(c.finish),
            opt(c.popularity),
            opt(c.odds)
        )?;
    }

    writeln!(out)?;
    if let Some(top) = &evaluation.top_pick {
        writeln!(out, "Top pick: {} (finish: {})", top.name, opt(top.finish))?;
    }
    writeln!(out, "In the money: {}", evaluation.in_the_money.join(", "))?;
    if let Some(rho) = evaluation.rank_correlation {
        writeln!(out, "Rank correlation: {:.3}", rho)?;
    }

    writeln!(out, "Rated above popularity:")?;
    for c in &evaluation.undervalued {
        writeln!(
            out,
            "  {} | model {} | popularity {} | gap {}",
            c.name,
            opt(c.model_rank),
            opt(c.popularity),
            opt(c.popularity_gap)
        )?;
    }
    Ok(())
}

/// Plain-text comparison of model ranking and actual result
pub fn render_evaluation(evaluation: &RaceEvaluation) -> String {
    let mut out = String::new();
    write_evaluation(&mut out, evaluation).map(|()| out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::data::RaceResultRow;
    use crate::evaluation::{evaluate_race, DEFAULT_GAP_THRESHOLD};
    use crate::models::{CourseWeight, HorseEntry, PastRaceRecord, RaceContext, Surface};
    use crate::pipeline::score_with_weight;

    fn create_test_race() -> ScoredRace {
        let past = |time: &str, passage: &str| PastRaceRecord {
            distance: Some("芝1600".to_string()),
            time: Some(time.to_string()),
            closing: Some("34.0".to_string()),
            passage: Some(passage.to_string()),
            ..Default::default()
        };
        let horses = vec![
            HorseEntry::new("Alpha").with_past_races(vec![past("1:33.0", "1-1")]),
            HorseEntry::new("Beta").with_past_races(vec![past("1:35.0", "9-9")]),
        ];
        score_with_weight(
            RaceContext {
                race_id: "2025TEST".to_string(),
                course: "東京".to_string(),
                surface: Surface::Turf,
                distance: 1600,
            },
            &horses,
            CourseWeight {
                speed: 1.2,
                lead: 0.7,
                closing: 1.4,
            },
            &ScoringConfig::new(1600, Surface::Turf),
        )
    }

    #[test]
    fn test_file_names() {
        let race = create_test_race();
        assert_eq!(scored_file_name(&race), "race_2025TEST_1600m_東京_course.csv");
        assert_eq!(report_file_name(&race), "report_2025TEST_1600m_東京.txt");
    }

    #[test]
    fn test_dataframe_shape() {
        let race = create_test_race();
        let df = scored_race_to_dataframe(&race).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 16);
        assert!(df.column("aptitude").is_ok());
    }

    #[test]
    fn test_render_report() {
        let race = create_test_race();
        let report = render_report(&race);

        assert!(report.contains("Race ID: 2025TEST"));
        assert!(report.contains("Distance: 1600m"));
        assert!(report.contains("1位 | Alpha"));
        assert!(report.contains("2位 | Beta"));
        assert!(!report.contains("Unscored"));
    }

    #[test]
    fn test_render_report_unscored_section() {
        let mut race = create_test_race();
        let last = race.ranking.pop().unwrap();
        race.unscored.push(last.index);

        let report = render_report(&race);
        assert!(report.contains("1位 | Alpha"));
        assert!(report.contains("--- Unscored ---\nBeta\n"));
    }

    #[test]
    fn test_write_outputs() {
        let race = create_test_race();
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("assets").join(scored_file_name(&race));
        write_scored_csv(&race, &csv_path).unwrap();
        let written = std::fs::read_to_string(&csv_path).unwrap();
        assert!(written.starts_with("name,frame,horse_no"));
        assert!(written.contains("Alpha"));

        let report_path = dir.path().join("reports").join(report_file_name(&race));
        write_report(&race, &report_path).unwrap();
        assert!(std::fs::read_to_string(&report_path)
            .unwrap()
            .contains("Model Ranking"));
    }

    #[test]
    fn test_render_evaluation() {
        let race = create_test_race();
        let results = vec![RaceResultRow {
            name: "Alpha".to_string(),
            finish: Some(1),
            popularity: Some(2),
            odds: Some(4.0),
        }];
        let text = render_evaluation(&evaluate_race(&race, &results, DEFAULT_GAP_THRESHOLD));
        assert!(text.contains("Top pick: Alpha (finish: 1)"));
        assert!(text.contains("In the money: Alpha"));
    }
}
