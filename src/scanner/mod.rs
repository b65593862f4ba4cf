//! Forward-only cursors over posting lists and their per-field aggregation

mod cursor;
mod field_scanner;

pub use cursor::EntriesCursor;
pub use field_scanner::{sort_scanners, FieldScanner};
