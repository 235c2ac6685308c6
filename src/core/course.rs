//! Course aptitude scoring
//!
//! Weighted sum of the three deviation scores using the course/surface/distance
//! weights, then (by default) re-expressed as a deviation score across the field.

use serde::{Deserialize, Serialize};

use crate::config::AptitudeMode;
use crate::core::deviation::{round_to, to_deviation};
use crate::models::{CourseWeight, DeviationScoreTriple};

const RAW_DECIMALS: i32 = 4;

/// Weighted course score for one horse; `None` if any input is missing
pub fn raw_course_score(
    speed: Option<f64>,
    lead: Option<f64>,
    closing: Option<f64>,
    weight: &CourseWeight,
) -> Option<f64> {
    let raw = speed? * weight.speed + lead? * weight.lead + closing? * weight.closing;
    Some(round_to(raw, RAW_DECIMALS))
}

/// Course scores for one horse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseScore {
    pub raw: Option<f64>,
    pub aptitude: Option<f64>,
}

/// Applies one course weight to a field
pub struct CourseScorer {
    weight: CourseWeight,
    mode: AptitudeMode,
}

impl CourseScorer {
    pub fn new(weight: CourseWeight, mode: AptitudeMode) -> Self {
        Self { weight, mode }
    }

    /// Score every horse, preserving order
    pub fn score_field(&self, deviations: &[DeviationScoreTriple]) -> Vec<CourseScore> {
        let raws: Vec<Option<f64>> = deviations
            .iter()
            .map(|d| raw_course_score(Some(d.speed), Some(d.lead), Some(d.closing), &self.weight))
            .collect();

        let aptitudes: Vec<Option<f64>> = match self.mode {
            AptitudeMode::DoubleDeviation => to_deviation(&raws).into_iter().map(Some).collect(),
            AptitudeMode::Direct => raws.clone(),
        };

        raws.into_iter()
            .zip(aptitudes)
            .map(|(raw, aptitude)| CourseScore { raw, aptitude })
            .collect()
    }
}
