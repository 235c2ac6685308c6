//! Data loading and parsing modules

pub mod course_weights;
pub mod csv_loader;
pub mod parser;
pub mod race_list;
pub mod results_loader;

// Re-export commonly used types
pub use course_weights::{weight_key, CourseWeights, DEFAULT_WEIGHTS_PATH};
pub use csv_loader::{load_entries, EntryTable, PastField, TableSchema};
pub use race_list::{parse_race_list, RaceListEntry};
pub use results_loader::{load_results, RaceResultRow};
