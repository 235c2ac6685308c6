//! Scoring pipeline building blocks

pub mod course;
pub mod deviation;
pub mod features;
pub mod normalizer;
pub mod ranker;

// Re-export commonly used types
pub use course::{raw_course_score, CourseScore, CourseScorer};
pub use deviation::{to_deviation, ColumnStats};
pub use features::{FeatureAggregator, HorseFeatures, RecordEvaluation};
pub use normalizer::convert_distance_time;
pub use ranker::{dense_rank, Ranking};
