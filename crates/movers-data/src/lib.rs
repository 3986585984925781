#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/movers/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod constituents;
pub mod error;
pub mod frame;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheStats, SqliteCache};
pub use constituents::{CsvConstituentSource, DEFAULT_CONSTITUENTS_URL, parse_constituents_csv};
pub use error::{DataError, Result};
pub use provider::{ConstituentSource, PriceSeriesProvider};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
