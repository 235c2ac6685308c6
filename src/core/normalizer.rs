//! Distance/time normalization
//!
//! Converts a time run over one distance into an equivalent time at the target
//! distance:
//!     t' = t * (target / original) + |target - original| / 200 * adj
//!
//! Where adj is the per-furlong correction for the surface (0.4s turf, 0.7s dirt
//! by default). Dirt gets the larger correction since pace decays faster there.

use crate::config::{DistanceAdjustment, FURLONG_METERS};
use crate::models::Surface;

/// Convert an elapsed time to the equivalent time at `target_distance`.
///
/// Returns `None` when any input is missing or the original distance is zero.
///
/// # Examples
/// ```
/// use keiba::config::DistanceAdjustment;
/// use keiba::core::normalizer::convert_distance_time;
/// use keiba::models::Surface;
///
/// let adj = DistanceAdjustment::default();
/// let t = convert_distance_time(Some(93.5), Some(1400), Some(1400), Surface::Turf, &adj);
/// assert_eq!(t, Some(93.5));
/// ```
pub fn convert_distance_time(
    elapsed: Option<f64>,
    original_distance: Option<u32>,
    target_distance: Option<u32>,
    surface: Surface,
    adjustment: &DistanceAdjustment,
) -> Option<f64> {
    let elapsed = elapsed?;
    let original = original_distance.filter(|&d| d > 0)? as f64;
    let target = target_distance? as f64;

    let base = elapsed * (target / original);
    let diff_furlongs = (target - original).abs() / FURLONG_METERS;
    let converted = base + diff_furlongs * adjustment.per_furlong(surface);

    converted.is_finite().then_some(converted)
}
