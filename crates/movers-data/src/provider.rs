//! Collaborator interfaces consumed by the ranking pipeline.

use crate::error::Result;
use chrono::NaiveDate;
use movers::{ConstituentDirectory, PriceSeries};
use std::future::Future;

/// Supplies the index constituent list with descriptive metadata.
///
/// A failure here is fatal to the whole query: implementations report it as
/// [`DataError::SourceUnavailable`](crate::DataError::SourceUnavailable)
/// rather than returning a partial directory.
pub trait ConstituentSource: Send + Sync {
    /// Load the current constituent directory.
    fn fetch(&self) -> impl Future<Output = Result<ConstituentDirectory>> + Send;
}

/// Supplies daily adjusted-close history for one ticker at a time.
pub trait PriceSeriesProvider: Send + Sync {
    /// Fetch `symbol` between `start` and `end` inclusive, reporting why a
    /// fetch failed.
    fn try_fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<PriceSeries>> + Send;

    /// Fetch `symbol`, returning `None` instead of an error.
    ///
    /// A single ticker failing never aborts the caller; the failure is logged.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Option<PriceSeries>> + Send {
        async move {
            match self.try_fetch(symbol, start, end).await {
                Ok(series) => Some(series),
                Err(e) => {
                    tracing::warn!(symbol, error = %e, "price fetch failed");
                    None
                }
            }
        }
    }
}
