//! SQLite caching layer for adjusted-close quotes.

use crate::error::{DataError, Result};
use crate::frame::quote_frame;
use chrono::{NaiveDate, Utc};
use polars::prelude::*;
use rusqlite::{Connection, params};
use std::path::Path;

/// SQLite cache for quote data.
///
/// Besides the quote rows, the cache records which date ranges were fetched in
/// full for each symbol, so a partially cached range is never mistaken for a
/// complete one.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                adjusted_close REAL NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS coverage (
                symbol TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, start_date, end_date)
            )",
            [],
        )?;

        Ok(())
    }

    /// Check whether a single recorded fetch covers `[start, end]` for `symbol`.
    pub fn has_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM coverage
             WHERE symbol = ?1 AND start_date <= ?2 AND end_date >= ?3",
            params![symbol, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Get cached quotes for a symbol and date range.
    ///
    /// # Returns
    /// A quote frame with columns: symbol, date, adjusted_close
    pub fn get_quotes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT date, adjusted_close
             FROM quotes
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;

        let rows = stmt.query_map(params![symbol, start.to_string(), end.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut dates = Vec::new();
        let mut adj_closes = Vec::new();
        for row in rows {
            let (date, adj_close) = row?;
            dates.push(date);
            adj_closes.push(adj_close);
        }

        if dates.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No cached data found".to_string(),
            });
        }

        quote_frame(symbol, dates, adj_closes)
    }

    /// Store a quote frame and record that `[start, end]` was fetched in full.
    ///
    /// Coverage is clamped to end before today so a range fetched while the
    /// current session is still trading is fetched again next time.
    pub fn put_quotes(&self, df: &DataFrame, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();

        let symbols = df.column("symbol")?.str()?;
        let dates = df.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let adj_closes = df.column("adjusted_close")?.f64()?;

        let tx = self.conn.unchecked_transaction()?;
        let mut written_symbols = Vec::new();

        for i in 0..df.height() {
            let symbol = symbols
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing symbol".to_string()))?;
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing date".to_string()))?;
            let adj_close = adj_closes
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing adjusted_close".to_string()))?;

            tx.execute(
                "INSERT OR REPLACE INTO quotes (symbol, date, adjusted_close, cached_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![symbol, date, adj_close, cached_at],
            )?;

            if !written_symbols.contains(&symbol) {
                written_symbols.push(symbol);
            }
        }

        let today = Utc::now().date_naive();
        let covered_end = end.min(today.pred_opt().unwrap_or(today));
        if start <= covered_end {
            for symbol in written_symbols {
                tx.execute(
                    "INSERT OR REPLACE INTO coverage (symbol, start_date, end_date, cached_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![symbol, start.to_string(), covered_end.to_string(), cached_at],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM quotes", [])?;
        self.conn.execute("DELETE FROM coverage", [])?;
        Ok(())
    }

    /// Clear cached data for a specific symbol.
    pub fn clear_symbol(&self, symbol: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM quotes WHERE symbol = ?1", params![symbol])?;
        self.conn
            .execute("DELETE FROM coverage WHERE symbol = ?1", params![symbol])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let quotes_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;

        let symbols_count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT symbol) FROM quotes", [], |row| {
                    row.get(0)
                })?;

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM quotes",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let parse = |s: Option<String>| -> Result<Option<NaiveDate>> {
            s.map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| DataError::Parse(format!("Invalid cached date {:?}: {}", s, e)))
            })
            .transpose()
        };

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
            first_date: parse(first)?,
            last_date: parse(last)?,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols
    pub unique_symbols: usize,
    /// Earliest cached date
    pub first_date: Option<NaiveDate>,
    /// Latest cached date
    pub last_date: Option<NaiveDate>,
}
