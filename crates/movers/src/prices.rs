//! Adjusted-close price series and the date-indexed price matrix.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single adjusted-close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Adjusted close price.
    pub adjusted_close: f64,
}

/// Ordered adjusted-close history for one ticker.
///
/// Points are kept sorted by date. Gaps are allowed; a repeated date keeps the
/// last value supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create an empty series.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Build a series from `(date, adjusted_close)` pairs in any order.
    pub fn from_points<I>(symbol: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let by_date: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
        Self {
            symbol: symbol.into(),
            points: by_date
                .into_iter()
                .map(|(date, adjusted_close)| PricePoint {
                    date,
                    adjusted_close,
                })
                .collect(),
        }
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Observations in ascending date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Exact-date lookup.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].adjusted_close)
    }

    /// First and last observation dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }
}

/// Date-indexed, ticker-columned table of adjusted closes.
///
/// Rows are the union of every series' dates. A cell is absent when a ticker
/// did not trade (or was not returned) on that date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMatrix {
    rows: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
    symbols: BTreeSet<String>,
}

impl PriceMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from a collection of series.
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = PriceSeries>,
    {
        let mut matrix = Self::new();
        for s in series {
            matrix.insert_series(&s);
        }
        matrix
    }

    /// Add (or overwrite) a ticker's column.
    ///
    /// An empty series contributes no rows and no column.
    pub fn insert_series(&mut self, series: &PriceSeries) {
        if series.is_empty() {
            return;
        }
        self.symbols.insert(series.symbol().to_string());
        for point in series.points() {
            self.rows
                .entry(point.date)
                .or_default()
                .insert(series.symbol().to_string(), point.adjusted_close);
        }
    }

    /// Whether the matrix has a row for this exact date.
    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.rows.contains_key(&date)
    }

    /// Price for a ticker on an exact date.
    pub fn price(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        self.rows.get(&date)?.get(symbol).copied()
    }

    /// All prices on an exact date, keyed by ticker.
    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(&date)
    }

    /// Ticker columns in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Row dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Number of ticker columns.
    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Number of date rows.
    pub fn n_dates(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix holds no tickers.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<PriceSeries> for PriceMatrix {
    fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
        Self::from_series(iter)
    }
}
