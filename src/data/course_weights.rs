//! Course weight configuration
//!
//! JSON keyed by course, then by surface tag + distance:
//!
//! ```json
//! { "東京": { "芝1600": { "speed": 1.2, "lead": 0.7, "closing": 1.4 } } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{validate_weight, Result, ScoringError};
use crate::models::{CourseWeight, Surface};

/// Default location of the weight file (relative to project root)
pub const DEFAULT_WEIGHTS_PATH: &str = "config/course_weight.json";

/// Weight table key for a surface and distance, e.g. "芝1600"
pub fn weight_key(surface: Surface, distance: u32) -> String {
    format!("{}{}", surface.tag(), distance)
}

/// All configured course weights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseWeights {
    courses: BTreeMap<String, BTreeMap<String, CourseWeight>>,
}

impl CourseWeights {
    /// Load and validate weights from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let weights = Self::from_json_str(&content)?;
        info!(
            "Loaded course weights for {} courses from {:?}",
            weights.courses.len(),
            path
        );
        Ok(weights)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let weights: Self = serde_json::from_str(content)?;
        weights.validate()?;
        Ok(weights)
    }

    fn validate(&self) -> Result<()> {
        for (course, entries) in &self.courses {
            for (key, weight) in entries {
                let label = |name: &str| format!("{}/{}/{}", course, key, name);
                validate_weight(&label("speed"), weight.speed)?;
                validate_weight(&label("lead"), weight.lead)?;
                validate_weight(&label("closing"), weight.closing)?;
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, course: &str, surface: Surface, distance: u32, weight: CourseWeight) {
        self.courses
            .entry(course.to_string())
            .or_default()
            .insert(weight_key(surface, distance), weight);
    }

    /// Exact-match lookup. A missing entry is a configuration error.
    pub fn lookup(&self, course: &str, surface: Surface, distance: u32) -> Result<CourseWeight> {
        let entries = self
            .courses
            .get(course)
            .ok_or_else(|| ScoringError::UnknownCourse(course.to_string()))?;

        let key = weight_key(surface, distance);
        entries
            .get(&key)
            .copied()
            .ok_or(ScoringError::MissingCourseWeight {
                course: course.to_string(),
                key,
            })
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }

    /// Configured surface/distance keys for a course
    pub fn keys_for(&self, course: &str) -> Vec<&str> {
        self.courses
            .get(course)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
