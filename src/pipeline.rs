//! End-to-end scoring of one race field
//!
//! raw history → features → deviation scores → course score → ranking

use tracing::info;

use crate::config::ScoringConfig;
use crate::core::{dense_rank, to_deviation, CourseScorer, FeatureAggregator};
use crate::core::ranker::ranks_by_index;
use crate::data::CourseWeights;
use crate::error::Result;
use crate::models::{
    CourseWeight, DeviationScoreTriple, HorseEntry, RaceContext, ScoredHorse, ScoredRace,
};

/// Score a field, resolving the course weight from configuration.
///
/// Fails only on configuration problems (invalid settings, missing weight).
pub fn score_race(
    race_id: &str,
    course: &str,
    horses: &[HorseEntry],
    weights: &CourseWeights,
    config: &ScoringConfig,
) -> Result<ScoredRace> {
    config.validate()?;
    let weight = weights.lookup(course, config.target_surface, config.target_distance)?;

    let context = RaceContext {
        race_id: race_id.to_string(),
        course: course.to_string(),
        surface: config.target_surface,
        distance: config.target_distance,
    };
    Ok(score_with_weight(context, horses, weight, config))
}

/// Score a field with an already resolved course weight
pub fn score_with_weight(
    context: RaceContext,
    horses: &[HorseEntry],
    weight: CourseWeight,
    config: &ScoringConfig,
) -> ScoredRace {
    let features = FeatureAggregator::aggregate_field(horses, config);

    let speed_raw: Vec<Option<f64>> = features.iter().map(|f| f.raw.speed).collect();
    let closing_raw: Vec<Option<f64>> = features.iter().map(|f| f.raw.closing).collect();
    let lead_raw: Vec<Option<f64>> = features.iter().map(|f| f.raw.lead).collect();

    let deviations: Vec<DeviationScoreTriple> = to_deviation(&speed_raw)
        .into_iter()
        .zip(to_deviation(&closing_raw))
        .zip(to_deviation(&lead_raw))
        .map(|((speed, closing), lead)| DeviationScoreTriple {
            speed,
            closing,
            lead,
        })
        .collect();

    let course_scores = CourseScorer::new(weight, config.aptitude_mode).score_field(&deviations);

    let aptitudes: Vec<Option<f64>> = course_scores.iter().map(|s| s.aptitude).collect();
    let ranking = dense_rank(&aptitudes);
    let ranks = ranks_by_index(&ranking, horses.len());

    let scored: Vec<ScoredHorse> = horses
        .iter()
        .zip(features)
        .zip(deviations)
        .zip(course_scores)
        .zip(ranks)
        .map(|((((horse, feat), deviation), course), rank)| ScoredHorse {
            name: horse.name.clone(),
            frame: horse.frame,
            horse_no: horse.horse_no,
            odds: horse.odds,
            raw: feat.raw,
            samples: feat.samples,
            deviation,
            raw_course_score: course.raw,
            aptitude: course.aptitude,
            rank,
        })
        .collect();

    let no_history = scored
        .iter()
        .filter(|h| h.samples.speed + h.samples.closing + h.samples.lead == 0)
        .count();
    info!(
        "Scored race {} ({} {}{}m): {} horses, {} ranked, {} without usable history",
        context.race_id,
        context.course,
        context.surface.tag(),
        context.distance,
        scored.len(),
        ranking.ranked.len(),
        no_history
    );

    ScoredRace {
        context,
        weight,
        horses: scored,
        ranking: ranking.ranked,
        unscored: ranking.unscored,
    }
}
