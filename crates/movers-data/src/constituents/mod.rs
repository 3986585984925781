//! Index constituent sources.

pub mod csv_source;

pub use csv_source::{CsvConstituentSource, DEFAULT_CONSTITUENTS_URL, parse_constituents_csv};
