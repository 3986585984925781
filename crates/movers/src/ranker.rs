//! Return ranking over an exact date range.
//!
//! The ranker is a pure function of a [`PriceMatrix`], a
//! [`ConstituentDirectory`] and two dates. It computes the percentage change
//! of every ticker's adjusted close between the two dates, keeps tickers that
//! have prices on both dates and a directory entry, and returns the best and
//! worst performers.

use crate::error::{RankError, Result};
use crate::prices::PriceMatrix;
use crate::universe::{Constituent, ConstituentDirectory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default number of entries in each of the top and bottom lists.
pub const DEFAULT_LIMIT: usize = 10;

/// A ticker's return over the queried range joined with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// GICS sector.
    pub sector: String,
    /// GICS sub-industry.
    pub industry: String,
    /// Percentage price return, rounded to two decimals.
    pub return_pct: f64,
}

impl ReturnRecord {
    /// Join a computed return with its constituent record.
    pub fn new(constituent: &Constituent, return_pct: f64) -> Self {
        Self {
            symbol: constituent.symbol.clone(),
            name: constituent.name.clone(),
            sector: constituent.sector.clone(),
            industry: constituent.industry.clone(),
            return_pct,
        }
    }
}

impl fmt::Display for ReturnRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {:+.2}% [{} / {}]",
            self.symbol, self.name, self.return_pct, self.sector, self.industry
        )
    }
}

/// Top and bottom performers for one date range.
///
/// Both lists are ordered by descending return, so `bottom` runs from the
/// least negative to the most negative performer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// First date of the range.
    pub start: NaiveDate,
    /// Last date of the range.
    pub end: NaiveDate,
    /// Best performers.
    pub top: Vec<ReturnRecord>,
    /// Worst performers.
    pub bottom: Vec<ReturnRecord>,
}

impl Ranking {
    /// A ranking with no entries.
    pub const fn empty(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            top: Vec::new(),
            bottom: Vec::new(),
        }
    }

    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.bottom.is_empty()
    }
}

/// Round to two decimal places, ties to even, folding negative zero into zero.
fn round_2dp(value: f64) -> f64 {
    let rounded = (value * 100.0).round_ties_even() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Percentage change from `start_price` to `end_price`, rounded to two decimals.
///
/// Returns `None` when the start price is zero, negative or not finite, or when
/// the end price is not finite.
///
/// ```
/// use movers::ranker::percentage_return;
///
/// assert_eq!(percentage_return(100.0, 110.0), Some(10.0));
/// assert_eq!(percentage_return(50.0, 45.0), Some(-10.0));
/// assert_eq!(percentage_return(0.0, 45.0), None);
/// ```
pub fn percentage_return(start_price: f64, end_price: f64) -> Option<f64> {
    if !start_price.is_finite() || start_price <= 0.0 || !end_price.is_finite() {
        return None;
    }
    Some(round_2dp((end_price - start_price) / start_price * 100.0))
}

fn by_return_desc(a: &ReturnRecord, b: &ReturnRecord) -> Ordering {
    b.return_pct
        .total_cmp(&a.return_pct)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

fn by_return_asc(a: &ReturnRecord, b: &ReturnRecord) -> Ordering {
    a.return_pct
        .total_cmp(&b.return_pct)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Ranks tickers by percentage return between two exact dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnRanker {
    limit: usize,
}

impl ReturnRanker {
    /// Create a ranker returning [`DEFAULT_LIMIT`] entries per list.
    pub const fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the number of entries per list.
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Number of entries per list.
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Compute the ranking.
    ///
    /// # Errors
    ///
    /// - [`RankError::InvalidRange`] if `start` is after `end`.
    /// - [`RankError::MissingDate`] if either date has no row in `matrix`.
    ///
    /// A matrix with no tickers at all yields an empty ranking rather than
    /// an error.
    pub fn rank(
        &self,
        matrix: &PriceMatrix,
        directory: &ConstituentDirectory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Ranking> {
        if start > end {
            return Err(RankError::InvalidRange { start, end });
        }

        if matrix.is_empty() {
            tracing::warn!("price matrix is empty; returning an empty ranking");
            return Ok(Ranking::empty(start, end));
        }

        let start_row = matrix
            .row(start)
            .ok_or(RankError::MissingDate { date: start })?;
        let end_row = matrix
            .row(end)
            .ok_or(RankError::MissingDate { date: end })?;

        let mut no_price = 0usize;
        let mut unlisted = 0usize;
        let mut records = Vec::with_capacity(start_row.len());

        for (symbol, &start_price) in start_row {
            let Some(pct) = end_row
                .get(symbol)
                .and_then(|&end_price| percentage_return(start_price, end_price))
            else {
                no_price += 1;
                continue;
            };

            match directory.get(symbol) {
                Some(constituent) => records.push(ReturnRecord::new(constituent, pct)),
                None => unlisted += 1,
            }
        }

        // Tickers with no observation on the start date never enter the loop.
        no_price += matrix.n_symbols() - start_row.len();

        tracing::debug!(
            ranked = records.len(),
            no_price,
            unlisted,
            %start,
            %end,
            "computed returns"
        );

        records.sort_by(by_return_desc);
        let top: Vec<_> = records.iter().take(self.limit).cloned().collect();

        records.sort_by(by_return_asc);
        records.truncate(self.limit);
        records.sort_by(by_return_desc);

        Ok(Ranking {
            start,
            end,
            top,
            bottom: records,
        })
    }
}

impl Default for ReturnRanker {
    fn default() -> Self {
        Self::new()
    }
}

/// Rank with the default list length of ten.
///
/// See [`ReturnRanker::rank`].
pub fn rank_returns(
    matrix: &PriceMatrix,
    directory: &ConstituentDirectory,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Ranking> {
    ReturnRanker::new().rank(matrix, directory, start, end)
}
