//! Evaluation Metrics
//!
//! Compare model ranking against actual finishing order and popularity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::data::RaceResultRow;
use crate::models::ScoredRace;

/// Finishing positions that count as "in the money"
pub const IN_THE_MONEY: u32 = 3;

/// Default popularity-minus-model-rank gap that flags an undervalued horse
pub const DEFAULT_GAP_THRESHOLD: i64 = 5;

/// Model view vs actual outcome for one horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseComparison {
    pub name: String,
    pub model_rank: Option<u32>,
    pub score: Option<f64>,
    pub finish: Option<u32>,
    pub popularity: Option<u32>,
    pub odds: Option<f64>,
    /// popularity − model rank; positive when the model rates the horse above the market
    pub popularity_gap: Option<i64>,
}

/// Evaluation of one race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceEvaluation {
    pub race_id: String,
    pub course: String,
    /// Ordered by model rank, unscored last
    pub comparisons: Vec<HorseComparison>,
    pub top_pick: Option<HorseComparison>,
    /// Names of horses finishing inside the top three
    pub in_the_money: Vec<String>,
    pub undervalued: Vec<HorseComparison>,
    /// Rank correlation between model rank and finish
    pub rank_correlation: Option<f64>,
    /// Scored horses with no result row
    pub unmatched: Vec<String>,
}

impl RaceEvaluation {
    pub fn top_pick_won(&self) -> bool {
        self.top_pick.as_ref().and_then(|p| p.finish) == Some(1)
    }

    pub fn top_pick_in_the_money(&self) -> bool {
        self.top_pick
            .as_ref()
            .and_then(|p| p.finish)
            .is_some_and(|f| f <= IN_THE_MONEY)
    }
}

/// 1-based ranks in ascending order; tied values share their average rank
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let var_x: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    let var_y: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Spearman rank correlation of paired values; `None` if undefined.
///
/// Both sides are re-ranked among the given pairs, so gaps left by unmatched
/// horses and ties in dense model ranks do not bend the result.
fn correlation(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    pearson(&average_ranks(&xs), &average_ranks(&ys))
}

/// Join a scored race with its result table by horse name
pub fn evaluate_race(race: &ScoredRace, results: &[RaceResultRow], gap_threshold: i64) -> RaceEvaluation {
    let by_name: HashMap<&str, &RaceResultRow> =
        results.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut unmatched = Vec::new();
    let order = race
        .ranking
        .iter()
        .map(|r| r.index)
        .chain(race.unscored.iter().copied());

    let comparisons: Vec<HorseComparison> = order
        .map(|i| {
            let horse = &race.horses[i];
            let result = by_name.get(horse.name.as_str()).copied();
            if result.is_none() {
                unmatched.push(horse.name.clone());
            }
            let popularity = result.and_then(|r| r.popularity);

            HorseComparison {
                name: horse.name.clone(),
                model_rank: horse.rank,
                score: horse.aptitude,
                finish: result.and_then(|r| r.finish),
                popularity,
                odds: result.and_then(|r| r.odds).or(horse.odds),
                popularity_gap: match (popularity, horse.rank) {
                    (Some(p), Some(m)) => Some(p as i64 - m as i64),
                    _ => None,
                },
            }
        })
        .collect();

    if !unmatched.is_empty() {
        warn!(
            "Race {}: no result for {} horse(s): {}",
            race.context.race_id,
            unmatched.len(),
            unmatched.join(", ")
        );
    }

    let top_pick = comparisons.first().filter(|c| c.model_rank.is_some()).cloned();

    let mut in_the_money: Vec<&HorseComparison> = comparisons
        .iter()
        .filter(|c| c.finish.is_some_and(|f| f <= IN_THE_MONEY))
        .collect();
    in_the_money.sort_by_key(|c| c.finish);

    let undervalued = comparisons
        .iter()
        .filter(|c| c.popularity_gap.is_some_and(|g| g > gap_threshold))
        .cloned()
        .collect();

    let pairs: Vec<(f64, f64)> = comparisons
        .iter()
        .filter_map(|c| Some((c.model_rank? as f64, c.finish? as f64)))
        .collect();

    RaceEvaluation {
        race_id: race.context.race_id.clone(),
        course: race.context.course.clone(),
        in_the_money: in_the_money.into_iter().map(|c| c.name.clone()).collect(),
        top_pick,
        undervalued,
        rank_correlation: correlation(&pairs),
        comparisons,
        unmatched,
    }
}

/// Aggregate metrics over evaluated races
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub races: usize,
    pub top_pick_wins: usize,
    pub top_pick_win_rate: f64,
    pub top_pick_in_the_money: usize,
    pub top_pick_in_the_money_rate: f64,
    /// Mean over races where the correlation is defined
    pub mean_rank_correlation: Option<f64>,
}

/// Summarize evaluations
pub fn summarize(evaluations: &[RaceEvaluation]) -> EvaluationSummary {
    if evaluations.is_empty() {
        return EvaluationSummary::default();
    }

    let races = evaluations.len();
    let top_pick_wins = evaluations.iter().filter(|e| e.top_pick_won()).count();
    let top_pick_in_the_money = evaluations
        .iter()
        .filter(|e| e.top_pick_in_the_money())
        .count();

    let correlations: Vec<f64> = evaluations.iter().filter_map(|e| e.rank_correlation).collect();
    let mean_rank_correlation = if correlations.is_empty() {
        None
    } else {
        Some(correlations.iter().sum::<f64>() / correlations.len() as f64)
    };

    EvaluationSummary {
        races,
        top_pick_wins,
        top_pick_win_rate: top_pick_wins as f64 / races as f64,
        top_pick_in_the_money,
        top_pick_in_the_money_rate: top_pick_in_the_money as f64 / races as f64,
        mean_rank_correlation,
    }
}

/// Analysis results by dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub races: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub in_the_money: usize,
    pub in_the_money_rate: f64,
}

/// Analyze top-pick results by course
pub fn analyze_by_course(evaluations: &[RaceEvaluation]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&RaceEvaluation>> = HashMap::new();
    for evaluation in evaluations {
        grouped
            .entry(evaluation.course.as_str())
            .or_default()
            .push(evaluation);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(course, group)| {
            let races = group.len();
            let wins = group.iter().filter(|e| e.top_pick_won()).count();
            let in_the_money = group.iter().filter(|e| e.top_pick_in_the_money()).count();

            DimensionAnalysis {
                key: course.to_string(),
                races,
                wins,
                win_rate: wins as f64 / races as f64,
                in_the_money,
                in_the_money_rate: in_the_money as f64 / races as f64,
            }
        })
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}
