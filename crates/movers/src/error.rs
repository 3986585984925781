//! Error types for ranking operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for ranking operations.
pub type Result<T> = std::result::Result<T, RankError>;

/// Errors that can occur while ranking returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    /// Start date falls after end date.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// No row exists in the price matrix for the requested date.
    #[error("No price data available for {date}; choose a date with trading data")]
    MissingDate {
        /// The date without a matrix row
        date: NaiveDate,
    },

    /// Invalid ticker symbol.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}
