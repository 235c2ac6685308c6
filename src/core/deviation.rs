//! Deviation scores
//!
//! Field-relative standardisation rescaled for readability:
//!     dev = 50 + 10 * (x - mean) / std
//!
//! Mean and sample standard deviation are taken over the defined values of the
//! current field only. Missing values (and exact zeros, the empty-aggregate
//! sentinel) score exactly 50.

/// Standard deviation used when the field has no spread
pub const STD_FLOOR: f64 = 0.01;

/// Neutral deviation score
pub const NEUTRAL: f64 = 50.0;

/// Mean and sample standard deviation of a column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    /// `None` with fewer than two defined values
    pub std: Option<f64>,
    pub count: usize,
}

/// Compute column statistics over defined values, ignoring zeros
pub fn column_stats(column: &[Option<f64>]) -> Option<ColumnStats> {
    let values: Vec<f64> = column.iter().filter_map(|v| defined(*v)).collect();
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() < 2 {
        None
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    };

    Some(ColumnStats {
        mean,
        std,
        count: values.len(),
    })
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Convert a column of raw values into deviation scores, rounded to 2 decimals.
///
/// Output order matches input order and every output is defined.
///
/// # Examples
/// ```
/// use keiba::core::deviation::to_deviation;
///
/// let devs = to_deviation(&[Some(1.0), Some(2.0), Some(3.0), None]);
/// assert_eq!(devs, vec![40.0, 50.0, 60.0, 50.0]);
/// ```
pub fn to_deviation(column: &[Option<f64>]) -> Vec<f64> {
    let Some(stats) = column_stats(column) else {
        return vec![NEUTRAL; column.len()];
    };

    let std = match stats.std {
        Some(s) if s > 0.0 => s,
        _ => STD_FLOOR,
    };

    column
        .iter()
        .map(|v| match defined(*v) {
            Some(x) => round_to(NEUTRAL + 10.0 * (x - stats.mean) / std, 2),
            None => NEUTRAL,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_std(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn test_simple_column() {
        let devs = to_deviation(&[Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(devs, vec![40.0, 50.0, 60.0]);
    }

    #[test]
    fn test_mean_and_std_of_output() {
        let column: Vec<Option<f64>> = [101.2, 98.7, 103.4, 99.9, 100.5, 97.1, 102.8]
            .iter()
            .map(|v| Some(*v))
            .collect();
        let devs = to_deviation(&column);
        let (mean, std) = mean_std(&devs);
        // Rounding to 2dp introduces at most 0.005 per value
        assert!((mean - 50.0).abs() < 0.01);
        assert!((std - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_rescaling_is_stable() {
        let column: Vec<Option<f64>> = [0.61, 0.42, 0.88, 0.15, 0.73]
            .iter()
            .map(|v| Some(*v))
            .collect();
        let once = to_deviation(&column);
        let twice = to_deviation(&once.iter().map(|v| Some(*v)).collect::<Vec<_>>());
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 0.02);
        }
    }

    #[test]
    fn test_missing_values_are_neutral() {
        let devs = to_deviation(&[Some(10.0), None, Some(20.0), None]);
        assert_eq!(devs[1], 50.0);
        assert_eq!(devs[3], 50.0);
        // Stats are computed over defined values only
        assert!((devs[0] - (50.0 - 10.0 * 5.0 / 50f64.sqrt())).abs() < 0.01);
    }

    #[test]
    fn test_zero_treated_as_missing() {
        let devs = to_deviation(&[Some(0.0), Some(1.0), Some(3.0)]);
        assert_eq!(devs[0], 50.0);
        assert!(devs[1] < 50.0);
        assert!(devs[2] > 50.0);
    }

    #[test]
    fn test_zero_variance_uses_floor() {
        let devs = to_deviation(&[Some(5.0), Some(5.0), Some(5.0)]);
        assert_eq!(devs, vec![50.0, 50.0, 50.0]);
    }

    #[test]
    fn test_single_value() {
        let devs = to_deviation(&[Some(7.5), None]);
        assert_eq!(devs, vec![50.0, 50.0]);
    }

    #[test]
    fn test_all_missing() {
        assert_eq!(to_deviation(&[None, None]), vec![50.0, 50.0]);
        assert!(to_deviation(&[]).is_empty());
    }

    #[test]
    fn test_column_stats() {
        let stats = column_stats(&[Some(2.0), Some(4.0), None, Some(0.0)]).unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 3.0).abs() < 1e-9);
        assert!((stats.std.unwrap() - 2f64.sqrt()).abs() < 1e-9);
        assert!(column_stats(&[None]).is_none());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
    }
}
