//! Constituent list from a CSV table.
//!
//! The default source is the community-maintained S&P 500 constituents
//! dataset, whose columns are
//! `Symbol,Security,GICS Sector,GICS Sub-Industry,Headquarters Location,...`.

use crate::error::{DataError, Result};
use crate::provider::ConstituentSource;
use movers::universe::normalize_symbol;
use movers::{Constituent, ConstituentDirectory};
use std::path::PathBuf;
use std::time::Duration;

/// Public S&P 500 constituents table.
pub const DEFAULT_CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";

/// User agent sent with constituent requests.
const USER_AGENT: &str = "Movers/0.1 (index-return-ranker)";

/// Request timeout for the constituent download.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYMBOL_HEADERS: &[&str] = &["Symbol", "Ticker", "Ticker Symbol"];
const NAME_HEADERS: &[&str] = &["Security", "Name", "Company Name"];
const SECTOR_HEADERS: &[&str] = &["GICS Sector", "Sector"];
const INDUSTRY_HEADERS: &[&str] = &["GICS Sub-Industry", "Sub-Industry", "Industry"];

#[derive(Debug)]
enum Location {
    Remote { client: reqwest::Client, url: String },
    File(PathBuf),
}

/// Loads constituents from a CSV over HTTP or from a local file.
#[derive(Debug)]
pub struct CsvConstituentSource {
    location: Location,
}

impl CsvConstituentSource {
    /// Source reading [`DEFAULT_CONSTITUENTS_URL`].
    pub fn new() -> Result<Self> {
        Self::from_url(DEFAULT_CONSTITUENTS_URL)
    }

    /// Source reading a CSV from `url`.
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::from_url_with_timeout(url, REQUEST_TIMEOUT)
    }

    /// Source reading a CSV from `url`, giving up after `timeout`.
    pub fn from_url_with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            location: Location::Remote {
                client,
                url: url.into(),
            },
        })
    }

    /// Source reading a local CSV file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
        }
    }

    /// Human-readable description of where constituents come from.
    pub fn describe(&self) -> String {
        match &self.location {
            Location::Remote { url, .. } => url.clone(),
            Location::File(path) => path.display().to_string(),
        }
    }

    async fn download(client: &reqwest::Client, url: &str) -> Result<String> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::SourceUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(DataError::SourceUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DataError::SourceUnavailable(format!("{}: {}", url, e)))
    }
}

impl ConstituentSource for CsvConstituentSource {
    async fn fetch(&self) -> Result<ConstituentDirectory> {
        let text = match &self.location {
            Location::Remote { client, url } => Self::download(client, url).await?,
            Location::File(path) => std::fs::read_to_string(path).map_err(|e| {
                DataError::SourceUnavailable(format!("{}: {}", path.display(), e))
            })?,
        };

        let directory = parse_constituents_csv(&text)?;
        tracing::info!(
            source = %self.describe(),
            constituents = directory.len(),
            "loaded constituents"
        );
        Ok(directory)
    }
}

fn column_index(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
}

fn required_column(headers: &csv::StringRecord, aliases: &[&str]) -> Result<usize> {
    column_index(headers, aliases).ok_or_else(|| {
        DataError::SourceUnavailable(format!("constituent table has no {:?} column", aliases[0]))
    })
}

/// Parse a constituent table.
///
/// Requires symbol, company name and sector columns; the sub-industry column is
/// optional. Symbols are normalized to the quote provider's format
/// (`BRK.B` becomes `BRK-B`). Rows with an unusable symbol are skipped.
///
/// # Errors
///
/// [`DataError::SourceUnavailable`] if the table is malformed, lacks a
/// required column, or yields no constituents.
pub fn parse_constituents_csv(text: &str) -> Result<ConstituentDirectory> {
    let malformed = |e: csv::Error| DataError::SourceUnavailable(format!("malformed CSV: {}", e));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(malformed)?.clone();

    let symbol_col = required_column(&headers, SYMBOL_HEADERS)?;
    let name_col = required_column(&headers, NAME_HEADERS)?;
    let sector_col = required_column(&headers, SECTOR_HEADERS)?;
    let industry_col = column_index(&headers, INDUSTRY_HEADERS);

    let mut constituents = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let field = |i: usize| record.get(i).unwrap_or_default().trim().to_string();

        let symbol = match normalize_symbol(record.get(symbol_col).unwrap_or_default()) {
            Ok(symbol) => symbol,
            Err(e) => {
                tracing::warn!(
                    line = ?record.position().map(|p| p.line()),
                    error = %e,
                    "skipping constituent row"
                );
                continue;
            }
        };

        constituents.push(Constituent::new(
            symbol,
            field(name_col),
            field(sector_col),
            industry_col.map(field).unwrap_or_default(),
        ));
    }

    if constituents.is_empty() {
        return Err(DataError::SourceUnavailable(
            "constituent table is empty".to_string(),
        ));
    }

    Ok(ConstituentDirectory::new(constituents))
}
