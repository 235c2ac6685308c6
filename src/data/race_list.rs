//! Batch race list
//!
//! One race per line, whitespace separated:
//!
//! ```text
//! race_id distance course surface [field_size]
//! 202505050812 1600 東京 芝 18
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DEFAULT_FIELD_SIZE;
use crate::models::Surface;

/// One race to score in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceListEntry {
    pub race_id: String,
    pub distance: u32,
    pub course: String,
    pub surface: Surface,
    pub field_size: u32,
}

fn parse_line(line: &str) -> Option<RaceListEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if !(4..=5).contains(&parts.len()) {
        return None;
    }

    let field_size = match parts.get(4) {
        Some(s) => s.parse().ok()?,
        None => DEFAULT_FIELD_SIZE,
    };

    Some(RaceListEntry {
        race_id: parts[0].to_string(),
        distance: parts[1].parse().ok()?,
        course: parts[2].to_string(),
        surface: Surface::from_arg(parts[3])?,
        field_size,
    })
}

/// Parse a race list. Blank lines and `#` comments are ignored; malformed
/// lines are skipped with a warning.
pub fn parse_race_list(text: &str) -> Vec<RaceListEntry> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|(line_no, line)| {
            let entry = parse_line(line);
            if entry.is_none() {
                warn!("Skipping malformed race list line {}: {}", line_no, line);
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_race_list() {
        let text = "# race_id distance course surface field_size\n\
                    202505050812 1600 東京 芝 18\n\
                    \n\
                    202506010101 1200 中山 dirt\n";
        let entries = parse_race_list(text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].race_id, "202505050812");
        assert_eq!(entries[0].distance, 1600);
        assert_eq!(entries[0].course, "東京");
        assert_eq!(entries[0].surface, Surface::Turf);
        assert_eq!(entries[0].field_size, 18);
        assert_eq!(entries[1].surface, Surface::Dirt);
        assert_eq!(entries[1].field_size, DEFAULT_FIELD_SIZE);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "202505050812 1600 東京\n\
                    202505050812 abc 東京 芝\n\
                    202505050812 1600 東京 障\n\
                    202505050812 1600 東京 芝 x\n\
                    202505050812 1600 東京 芝 16 extra\n\
                    202505050811 2400 東京 芝\n";
        let entries = parse_race_list(text);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].race_id, "202505050811");
    }
}
