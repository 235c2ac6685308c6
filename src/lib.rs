//! Keiba - Horse race course-aptitude scoring
//!
//! This library provides:
//! - Past-five feature extraction (speed, closing, lead) from race-card history
//! - Distance/time normalization with surface-dependent correction
//! - Field-relative deviation scores (50-centered, 10-scaled)
//! - Course-weighted aptitude scores and dense ranking
//! - Race card / result loading and report output
//!
//! # Example
//!
//! ```no_run
//! use keiba::config::ScoringConfig;
//! use keiba::data::{load_entries, CourseWeights};
//! use keiba::models::Surface;
//! use keiba::pipeline::score_race;
//!
//! let horses = load_entries("assets/race_202505050812_raw.csv").unwrap();
//! let weights = CourseWeights::load("config/course_weight.json").unwrap();
//! let config = ScoringConfig::new(1600, Surface::Turf).with_field_size(18);
//!
//! let race = score_race("202505050812", "東京", &horses, &weights, &config).unwrap();
//! for (entry, horse) in race.ranked_horses() {
//!     println!("{} {} {:.2}", entry.rank, horse.name, entry.score);
//! }
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use config::{AptitudeMode, ScoringConfig};
pub use data::{load_entries, load_results, CourseWeights, RaceResultRow};
pub use error::ScoringError;
pub use models::{
    CourseWeight, DeviationScoreTriple, HorseEntry, PastRaceRecord, RankedEntry, RawScoreTriple,
    ScoredHorse, ScoredRace, Surface,
};
pub use pipeline::{score_race, score_with_weight};
