//! Race-card field parsers
//!
//! Pure conversions from the raw text cells of a past-performance table into
//! numbers. A malformed cell becomes `None` and never aborts the batch.
//!
//! # Example
//!
//! ```
//! use keiba::data::parser::{parse_distance, parse_elapsed_time, parse_lead_position};
//!
//! assert_eq!(parse_distance(Some("芝1600")), Some(1600));
//! assert_eq!(parse_elapsed_time(Some("1:33.5")), Some(93.5));
//! assert!((parse_lead_position(Some("1-3-2-1"), 16).unwrap() - 0.9375).abs() < 1e-9);
//! ```

use encoding_rs::{SHIFT_JIS, UTF_8};
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use crate::models::{PaceCategory, Surface};

fn elapsed_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+):(\d+(?:\.\d+)?)$").expect("valid regex"))
}

/// Convert fullwidth digits to halfwidth
pub fn normalize_fullwidth_numbers(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Read a text file exported from the race site.
///
/// UTF-8 (with or without BOM) is tried first, then CP932.
pub fn read_text_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;

    let (decoded, _, had_errors) = UTF_8.decode(&bytes);
    if !had_errors {
        return Ok(decoded.into_owned());
    }

    let (decoded, _, had_errors) = SHIFT_JIS.decode(&bytes);
    if had_errors {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{:?} is neither UTF-8 nor CP932", path),
        ));
    }
    Ok(decoded.into_owned())
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|s| !s.is_empty())
}

/// Extract the meters from a distance descriptor ("芝1400", "ダ1200", "1400m")
pub fn parse_distance(text: Option<&str>) -> Option<u32> {
    let text = normalize_fullwidth_numbers(non_blank(text)?);
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// "1:33.5" → 93.5 seconds
pub fn parse_elapsed_time(text: Option<&str>) -> Option<f64> {
    let text = normalize_fullwidth_numbers(non_blank(text)?);
    let caps = elapsed_time_pattern().captures(&text)?;
    let minutes: f64 = caps[1].parse().ok()?;
    let seconds: f64 = caps[2].parse().ok()?;
    Some(minutes * 60.0 + seconds)
}

/// Closing-leg time in seconds ("34.5")
pub fn parse_closing_time(text: Option<&str>) -> Option<f64> {
    let value: f64 = non_blank(text)?.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Detect the surface from a distance descriptor. Turf markers win over dirt.
pub fn detect_surface(text: Option<&str>) -> Option<Surface> {
    let text = non_blank(text)?.to_lowercase();
    if text.contains('芝') || text.contains("turf") {
        return Some(Surface::Turf);
    }
    if text.contains('ダ') || text.contains('砂') || text.contains("dirt") {
        return Some(Surface::Dirt);
    }
    None
}

/// Early position as a fraction of the field: 1 − first_corner / field_size.
///
/// Front-runners approach 1.0. Not clamped, so a position beyond the field
/// size goes negative.
pub fn parse_lead_position(passage: Option<&str>, field_size: u32) -> Option<f64> {
    if field_size == 0 {
        return None;
    }
    let passage = normalize_fullwidth_numbers(non_blank(passage)?);
    let first: u32 = passage.split('-').next()?.trim().parse().ok()?;
    Some(1.0 - first as f64 / field_size as f64)
}

/// Pace text → category. Unrecognised text maps to `Unknown`.
pub fn parse_pace(text: Option<&str>) -> PaceCategory {
    let Some(text) = non_blank(text) else {
        return PaceCategory::Unknown;
    };
    match text.to_lowercase().as_str() {
        "ハイ" | "h" | "fast" | "high" => PaceCategory::Fast,
        "ミドル" | "m" | "even" | "middle" => PaceCategory::Even,
        "スロー" | "s" | "slow" => PaceCategory::Slow,
        _ => PaceCategory::Unknown,
    }
}
