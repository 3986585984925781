//! Export of rankings to CSV and JSON.

use crate::report::RankingReport;
use movers::{Ranking, ReturnRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One CSV row: a performer tagged with its list and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// `top` or `bottom`.
    pub list: String,
    /// 1-based position within the list.
    pub rank: usize,
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// GICS sector.
    pub sector: String,
    /// GICS sub-industry.
    pub industry: String,
    /// Percentage price return.
    pub return_pct: f64,
}

impl ExportRow {
    fn rows(list: &str, records: &[ReturnRecord]) -> impl Iterator<Item = Self> {
        records.iter().enumerate().map(move |(i, r)| Self {
            list: list.to_string(),
            rank: i + 1,
            symbol: r.symbol.clone(),
            name: r.name.clone(),
            sector: r.sector.clone(),
            industry: r.industry.clone(),
            return_pct: r.return_pct,
        })
    }

    /// Flatten both lists of a ranking, top first.
    pub fn from_lists(top: &[ReturnRecord], bottom: &[ReturnRecord]) -> Vec<Self> {
        Self::rows("top", top)
            .chain(Self::rows("bottom", bottom))
            .collect()
    }
}

fn write_csv(rows: &[ExportRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    if rows.is_empty() {
        wtr.write_record([
            "list",
            "rank",
            "symbol",
            "name",
            "sector",
            "industry",
            "return_pct",
        ])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for Ranking {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => write_csv(&ExportRow::from_lists(&self.top, &self.bottom)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for RankingReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                write_csv(&ExportRow::from_lists(&self.top.rows, &self.bottom.rows))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
