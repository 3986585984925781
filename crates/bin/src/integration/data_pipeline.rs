//! Data pipeline for fetching the price history of the index constituents.
//!
//! Symbols are fetched concurrently from a [`PriceSeriesProvider`]. Each task
//! yields a [`FetchOutcome`]; the outcomes are aggregated into a
//! [`FetchReport`] once every task has finished, so the result never depends
//! on the order in which fetches complete. Supports caching via SQLite to
//! avoid repeated Yahoo Finance API calls.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use movers::{PriceMatrix, PriceSeries, RankError};
use movers_data::frame::{frame_to_series, series_to_frame};
use movers_data::{DataError, PriceSeriesProvider, SqliteCache};
use movers_output::ExportError;

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Ranking error.
    #[error(transparent)]
    Rank(#[from] RankError),
    /// Data source error.
    #[error(transparent)]
    Data(#[from] DataError),
    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid command-line argument.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Default number of concurrent fetches.
pub(crate) const DEFAULT_CONCURRENCY: usize = 10;

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub(crate) struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached quotes, still store new ones).
    pub force_refresh: bool,
    /// Maximum number of fetches in flight.
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of fetching one symbol.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FetchOutcome {
    /// The series was retrieved.
    Fetched(PriceSeries),
    /// The series is unavailable.
    Failed {
        /// Symbol that failed.
        symbol: String,
        /// Human-readable cause.
        reason: String,
    },
}

/// Aggregated outcomes of a fetch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FetchReport {
    /// Retrieved series, sorted by symbol.
    pub series: Vec<PriceSeries>,
    /// `(symbol, reason)` for every failed fetch, sorted by symbol.
    pub failures: Vec<(String, String)>,
    /// How many series came from the cache.
    pub from_cache: usize,
}

impl FetchReport {
    /// Aggregate outcomes in any completion order.
    pub(crate) fn from_outcomes<I>(outcomes: I, from_cache: usize) -> Self
    where
        I: IntoIterator<Item = FetchOutcome>,
    {
        let mut report = Self {
            from_cache,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Fetched(series) => report.series.push(series),
                FetchOutcome::Failed { symbol, reason } => report.failures.push((symbol, reason)),
            }
        }
        report.series.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        report.failures.sort();
        report
    }

    /// Symbols whose fetch failed.
    pub(crate) fn failed_symbols(&self) -> Vec<&str> {
        self.failures.iter().map(|(s, _)| s.as_str()).collect()
    }

    /// Build the date-by-ticker matrix from the retrieved series.
    pub(crate) fn to_matrix(&self) -> PriceMatrix {
        PriceMatrix::from_series(self.series.iter().cloned())
    }
}

/// Reject a reversed range before anything is fetched.
pub(crate) fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), RankError> {
    if start > end {
        return Err(RankError::InvalidRange { start, end });
    }
    Ok(())
}

/// Look up `symbol` in the cache; any cache problem counts as a miss.
fn cached_series(
    cache: &SqliteCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<PriceSeries> {
    match cache.has_quotes(symbol, start, end) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            tracing::debug!(symbol, error = %e, "cache lookup failed");
            return None;
        }
    }

    match cache
        .get_quotes(symbol, start, end)
        .and_then(|df| frame_to_series(symbol, &df))
    {
        Ok(series) => Some(series),
        Err(e) => {
            tracing::debug!(symbol, error = %e, "cache read failed");
            None
        }
    }
}

fn store_series(cache: &SqliteCache, series: &PriceSeries, start: NaiveDate, end: NaiveDate) {
    let result = series_to_frame(series).and_then(|df| cache.put_quotes(&df, start, end));
    if let Err(e) = result {
        tracing::warn!(symbol = series.symbol(), error = %e, "failed to cache quotes");
    }
}

/// Fetch price series for all `symbols` with optional cache and progress bar.
///
/// A failed symbol is recorded in the report and never aborts the run. The
/// cache only ever serves ranges it recorded as fully fetched; it never
/// stands in for a fetch that failed in this run.
///
/// # Errors
///
/// [`RankError::InvalidRange`] if `start` is after `end`. Nothing is fetched
/// in that case.
pub(crate) async fn fetch_price_series<P: PriceSeriesProvider>(
    provider: &P,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    config: &FetchConfig,
    cache: Option<&SqliteCache>,
    progress: Option<&ProgressBar>,
) -> Result<FetchReport, PipelineError> {
    validate_range(start, end)?;

    let cache = cache.filter(|_| config.use_cache);

    let mut outcomes = Vec::with_capacity(symbols.len());
    let mut symbols_to_fetch = Vec::new();

    match cache {
        Some(cache) if !config.force_refresh => {
            for symbol in symbols {
                match cached_series(cache, symbol, start, end) {
                    Some(series) => outcomes.push(FetchOutcome::Fetched(series)),
                    None => symbols_to_fetch.push(symbol.clone()),
                }
            }
        }
        _ => symbols_to_fetch.extend(symbols.iter().cloned()),
    }
    let from_cache = outcomes.len();
    let concurrency = config.concurrency.max(1);

    tracing::debug!(
        cached = from_cache,
        to_fetch = symbols_to_fetch.len(),
        concurrency,
        "starting price fetch"
    );

    // Update progress bar length based on what we actually need to fetch
    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_position(from_cache as u64);
        if symbols_to_fetch.is_empty() {
            pb.set_message("Loading from cache...");
        } else {
            pb.set_message(format!(
                "Fetching {} symbols ({} concurrent)...",
                symbols_to_fetch.len(),
                concurrency
            ));
        }
    }

    let fetched: Vec<FetchOutcome> = stream::iter(symbols_to_fetch)
        .map(|symbol| async move {
            match provider.try_fetch(&symbol, start, end).await {
                Ok(series) => FetchOutcome::Fetched(series),
                Err(e) => FetchOutcome::Failed {
                    symbol,
                    reason: e.to_string(),
                },
            }
        })
        .buffer_unordered(concurrency)
        .inspect(|outcome| {
            if let FetchOutcome::Failed { symbol, reason } = outcome {
                let warn = || {
                    tracing::warn!(
                        symbol = %symbol,
                        reason = %reason,
                        "failed to fetch price data"
                    );
                };
                match progress {
                    Some(pb) => pb.suspend(warn),
                    None => warn(),
                }
            }
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    if let Some(cache) = cache {
        for outcome in &fetched {
            if let FetchOutcome::Fetched(series) = outcome {
                store_series(cache, series, start, end);
            }
        }
    }

    let report = FetchReport::from_outcomes(outcomes.into_iter().chain(fetched), from_cache);

    tracing::info!(
        fetched = report.series.len(),
        cached = report.from_cache,
        failed = report.failures.len(),
        "price fetch complete"
    );
    if !report.failures.is_empty() {
        tracing::warn!(
            count = report.failures.len(),
            symbols = %report.failed_symbols().join(", "),
            "price data unavailable for some symbols"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use movers_data::Result as DataResult;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    /// In-memory provider that counts calls and can delay symbols.
    #[derive(Debug, Default)]
    struct StubProvider {
        prices: HashMap<String, (f64, f64)>,
        delays_ms: HashMap<String, u64>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn with(mut self, symbol: &str, start: f64, end: f64) -> Self {
            self.prices.insert(symbol.to_string(), (start, end));
            self
        }

        fn delayed(mut self, symbol: &str, ms: u64) -> Self {
            self.delays_ms.insert(symbol.to_string(), ms);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PriceSeriesProvider for StubProvider {
        async fn try_fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> DataResult<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delays_ms.get(symbol) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            match self.prices.get(symbol) {
                Some(&(p0, p1)) => Ok(PriceSeries::from_points(symbol, [(start, p0), (end, p1)])),
                None => Err(DataError::MissingData {
                    symbol: symbol.to_string(),
                    reason: "No data returned".to_string(),
                }),
            }
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_cache() -> FetchConfig {
        FetchConfig {
            use_cache: false,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_mixed_success_and_failure() {
        let provider = StubProvider::default()
            .with("AAPL", 100.0, 101.0)
            .with("MSFT", 200.0, 190.0);
        let report = fetch_price_series(
            &provider,
            &symbols(&["AAPL", "GONE", "MSFT", "ZZZZ"]),
            d(8),
            d(9),
            &no_cache(),
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(provider.calls(), 4);
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.failed_symbols(), vec!["GONE", "ZZZZ"]);
        assert_eq!(report.from_cache, 0);

        let matrix = report.to_matrix();
        assert_eq!(matrix.n_symbols(), 2);
        assert_eq!(matrix.price(d(9), "MSFT"), Some(190.0));
    }

    #[tokio::test]
    async fn test_invalid_range_fetches_nothing() {
        let provider = StubProvider::default().with("AAPL", 1.0, 2.0);
        let result = fetch_price_series(
            &provider,
            &symbols(&["AAPL"]),
            d(9),
            d(8),
            &no_cache(),
            None,
            None,
        )
        .await;

        assert!(matches!(
            result,
            Err(PipelineError::Rank(RankError::InvalidRange { .. }))
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    #[tokio::test]
    async fn test_report_independent_of_completion_order(#[case] concurrency: usize) {
        let config = FetchConfig {
            concurrency,
            ..no_cache()
        };
        let names = symbols(&["A", "B", "C", "D"]);

        let fast_first = StubProvider::default()
            .with("A", 10.0, 11.0)
            .with("B", 10.0, 9.0)
            .with("D", 10.0, 10.0)
            .delayed("A", 30)
            .delayed("C", 20);
        let slow_first = StubProvider::default()
            .with("A", 10.0, 11.0)
            .with("B", 10.0, 9.0)
            .with("D", 10.0, 10.0)
            .delayed("D", 30)
            .delayed("B", 20);

        let first = fetch_price_series(&fast_first, &names, d(8), d(9), &config, None, None)
            .await
            .unwrap();
        let second = fetch_price_series(&slow_first, &names, d(8), d(9), &config, None, None)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.failed_symbols(), vec!["C"]);
    }

    #[tokio::test]
    async fn test_cache_serves_recorded_ranges() {
        let cache = SqliteCache::in_memory().unwrap();
        let names = symbols(&["AAPL", "MSFT"]);
        let provider = StubProvider::default()
            .with("AAPL", 100.0, 110.0)
            .with("MSFT", 50.0, 45.0);
        let config = FetchConfig::default();

        let first = fetch_price_series(&provider, &names, d(8), d(9), &config, Some(&cache), None)
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(first.from_cache, 0);

        let second = fetch_price_series(&provider, &names, d(8), d(9), &config, Some(&cache), None)
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(second.from_cache, 2);
        assert_eq!(second.series, first.series);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache_reads() {
        let cache = SqliteCache::in_memory().unwrap();
        let names = symbols(&["AAPL"]);
        let provider = StubProvider::default().with("AAPL", 100.0, 110.0);

        fetch_price_series(
            &provider,
            &names,
            d(8),
            d(9),
            &FetchConfig::default(),
            Some(&cache),
            None,
        )
        .await
        .unwrap();

        let refresh = FetchConfig {
            force_refresh: true,
            ..FetchConfig::default()
        };
        let report = fetch_price_series(&provider, &names, d(8), d(9), &refresh, Some(&cache), None)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(report.from_cache, 0);
    }

    #[tokio::test]
    async fn test_cache_never_replaces_failed_fetch() {
        let cache = SqliteCache::in_memory().unwrap();
        // Quotes on disk without a coverage record for the queried range.
        let stale = PriceSeries::from_points("GONE", [(d(8), 5.0)]);
        cache
            .put_quotes(&series_to_frame(&stale).unwrap(), d(8), d(8))
            .unwrap();

        let provider = StubProvider::default();
        let report = fetch_price_series(
            &provider,
            &symbols(&["GONE"]),
            d(8),
            d(9),
            &FetchConfig::default(),
            Some(&cache),
            None,
        )
        .await
        .unwrap();

        assert!(report.series.is_empty());
        assert_eq!(report.failed_symbols(), vec!["GONE"]);
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_matrix() {
        let provider = StubProvider::default();
        let report = fetch_price_series(
            &provider,
            &symbols(&["X", "Y"]),
            d(8),
            d(9),
            &no_cache(),
            None,
            None,
        )
        .await
        .unwrap();

        assert!(report.to_matrix().is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(d(8), d(9)).is_ok());
        assert!(validate_range(d(8), d(8)).is_ok());
        assert!(validate_range(d(9), d(8)).is_err());
    }
}
