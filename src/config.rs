//! Per-run scoring configuration
//!
//! Every constant the pipeline depends on travels in a [`ScoringConfig`] passed
//! to each invocation, so several races can be scored with different settings
//! side by side.

use serde::{Deserialize, Serialize};

use crate::error::{validate_distance, validate_field_size, Result};
use crate::models::{PaceCategory, Surface};

/// Furlong length used for distance correction
pub const FURLONG_METERS: f64 = 200.0;

/// Assumed full field when converting corner positions to fractions
pub const DEFAULT_FIELD_SIZE: u32 = 16;

/// Additive correction per pace category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceTable {
    pub fast: f64,
    pub even: f64,
    pub slow: f64,
}

impl PaceTable {
    /// Closing credit: a fast pace flatters the finish less, a slow pace more
    pub const CLOSING: PaceTable = PaceTable {
        fast: -8.0,
        even: 0.0,
        slow: 8.0,
    };

    /// Lead credit on the [0,1] fraction scale
    pub const LEAD: PaceTable = PaceTable {
        fast: 0.1,
        even: 0.0,
        slow: -0.1,
    };

    pub fn correction(&self, pace: PaceCategory) -> f64 {
        match pace {
            PaceCategory::Fast => self.fast,
            PaceCategory::Even => self.even,
            PaceCategory::Slow => self.slow,
            PaceCategory::Unknown => 0.0,
        }
    }
}

/// Seconds added per furlong of distance difference, by surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceAdjustment {
    pub turf: f64,
    pub dirt: f64,
}

impl DistanceAdjustment {
    /// Same correction on both surfaces
    pub fn flat(per_furlong: f64) -> Self {
        Self {
            turf: per_furlong,
            dirt: per_furlong,
        }
    }

    pub fn per_furlong(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Turf => self.turf,
            Surface::Dirt => self.dirt,
        }
    }
}

impl Default for DistanceAdjustment {
    fn default() -> Self {
        Self {
            turf: 0.4,
            dirt: 0.7,
        }
    }
}

/// How the final aptitude score is derived from the weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AptitudeMode {
    /// Re-scale the weighted sum across the field (comparable between races)
    #[default]
    DoubleDeviation,
    /// Use the weighted sum as is
    Direct,
}

/// Scoring settings for one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub target_distance: u32,
    pub target_surface: Surface,
    pub field_size: u32,
    pub closing_pace: PaceTable,
    pub lead_pace: PaceTable,
    pub distance_adjustment: DistanceAdjustment,
    pub aptitude_mode: AptitudeMode,
}

impl ScoringConfig {
    pub fn new(target_distance: u32, target_surface: Surface) -> Self {
        Self {
            target_distance,
            target_surface,
            field_size: DEFAULT_FIELD_SIZE,
            closing_pace: PaceTable::CLOSING,
            lead_pace: PaceTable::LEAD,
            distance_adjustment: DistanceAdjustment::default(),
            aptitude_mode: AptitudeMode::default(),
        }
    }

    pub fn with_field_size(mut self, field_size: u32) -> Self {
        self.field_size = field_size;
        self
    }

    pub fn with_mode(mut self, mode: AptitudeMode) -> Self {
        self.aptitude_mode = mode;
        self
    }

    pub fn with_distance_adjustment(mut self, adjustment: DistanceAdjustment) -> Self {
        self.distance_adjustment = adjustment;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_distance(self.target_distance)?;
        validate_field_size(self.field_size)?;
        Ok(())
    }
}
