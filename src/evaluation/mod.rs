//! Model ranking vs actual results

pub mod metrics;

pub use metrics::{
    analyze_by_course, evaluate_race, summarize, EvaluationSummary, HorseComparison,
    RaceEvaluation, DEFAULT_GAP_THRESHOLD,
};
