use polars::prelude::PolarsError;
use thiserror::Error;

/// Scoring errors
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Course exists in the weight file but has no entry for the surface/distance key
    #[error("No course weight for {course} '{key}'")]
    MissingCourseWeight { course: String, key: String },

    #[error("Course '{0}' is not configured")]
    UnknownCourse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Polars(#[from] PolarsError),
}

impl ScoringError {
    /// Configuration problems abort the race; data-quality problems never reach here
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScoringError::MissingCourseWeight { .. }
                | ScoringError::UnknownCourse(_)
                | ScoringError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Validation functions
pub fn validate_field_size(field_size: u32) -> Result<()> {
    if !(1..=28).contains(&field_size) {
        return Err(ScoringError::Validation(format!(
            "Field size must be between 1 and 28, got {}",
            field_size
        )));
    }
    Ok(())
}

pub fn validate_distance(distance: u32) -> Result<()> {
    if !(100..=4000).contains(&distance) {
        return Err(ScoringError::Validation(format!(
            "Distance must be between 100 and 4000 meters, got {}",
            distance
        )));
    }
    Ok(())
}

pub fn validate_weight(name: &str, weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ScoringError::InvalidConfig(format!(
            "Weight '{}' must be a non-negative number, got {}",
            name, weight
        )));
    }
    Ok(())
}
