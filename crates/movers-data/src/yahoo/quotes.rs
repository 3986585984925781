//! Adjusted-close history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::frame::{frame_to_series, quote_frame};
use crate::provider::PriceSeriesProvider;
use chrono::{DateTime, Days, NaiveDate};
use movers::PriceSeries;
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Yahoo Finance quote provider with optional rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

/// Midnight UTC of `date` as a Yahoo request bound.
fn to_offset_datetime(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("Invalid date {}", date)))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

impl YahooQuoteProvider {
    /// Create a provider without a delay between requests.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::ZERO)
    }

    /// Create a provider that sleeps `rate_limit_delay` after each request.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch adjusted closes for a single symbol.
    ///
    /// Both `start` and `end` are inclusive.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, adjusted_close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        // Yahoo treats the end bound as exclusive.
        let end_exclusive = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DataError::TimeConversion(format!("Date overflow after {}", end)))?;

        let response = self
            .provider
            .get_quote_history(
                symbol,
                to_offset_datetime(start)?,
                to_offset_datetime(end_exclusive)?,
            )
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if !self.rate_limit_delay.is_zero() {
            sleep(self.rate_limit_delay).await;
        }

        let mut dates = Vec::with_capacity(quotes.len());
        let mut adj_closes = Vec::with_capacity(quotes.len());
        for quote in &quotes {
            let Some(ts) = DateTime::from_timestamp(quote.timestamp, 0) else {
                return Err(DataError::TimeConversion(format!(
                    "Invalid timestamp {} for {}",
                    quote.timestamp, symbol
                )));
            };
            let date = ts.date_naive();
            if date < start || date > end {
                continue;
            }
            dates.push(date.to_string());
            adj_closes.push(quote.adjclose);
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        tracing::debug!(symbol, rows = dates.len(), "fetched quotes");
        quote_frame(symbol, dates, adj_closes)
    }
}

impl PriceSeriesProvider for YahooQuoteProvider {
    async fn try_fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let df = self.fetch_quotes(symbol, start, end).await?;
        frame_to_series(symbol, &df)
    }
}
