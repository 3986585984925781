//! Report generation for ranked performers.

use chrono::{DateTime, NaiveDate, Utc};
use movers::{DEFAULT_LIMIT, Ranking, ReturnRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Column headers of a performer table, in display order.
pub const COLUMNS: [&str; 5] = [
    "Ticker Symbol",
    "Company Name",
    "Sector",
    "Industry",
    "Price Return (%)",
];

const REPORT_TITLE: &str = "S&P 500 Top and Bottom Performers";

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One titled list of performers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingTable {
    /// Table title, e.g. "Top 10 Performers from 2024-08-08 to 2024-08-09".
    pub title: String,
    /// Rows ordered by descending return.
    pub rows: Vec<ReturnRecord>,
}

impl RankingTable {
    fn cells(record: &ReturnRecord) -> [String; 5] {
        [
            record.symbol.clone(),
            record.name.clone(),
            record.sector.clone(),
            record.industry.clone(),
            format!("{:.2}", record.return_pct),
        ]
    }
}

/// Top and bottom performer tables for one date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    /// First date of the range.
    pub start: NaiveDate,
    /// Last date of the range.
    pub end: NaiveDate,
    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Best performers.
    pub top: RankingTable,
    /// Worst performers.
    pub bottom: RankingTable,
}

impl RankingReport {
    /// Build a report titled with the default list length.
    pub fn from_ranking(ranking: &Ranking) -> Self {
        Self::with_count(ranking, DEFAULT_LIMIT)
    }

    /// Build a report whose titles announce `count` entries per list.
    pub fn with_count(ranking: &Ranking, count: usize) -> Self {
        let (start, end) = (ranking.start, ranking.end);
        Self {
            start,
            end,
            generated_at: Utc::now(),
            top: RankingTable {
                title: format!("Top {count} Performers from {start} to {end}"),
                rows: ranking.top.clone(),
            },
            bottom: RankingTable {
                title: format!("Bottom {count} Performers from {start} to {end}"),
                rows: ranking.bottom.clone(),
            },
        }
    }

    /// Both tables in order.
    pub fn tables(&self) -> [&RankingTable; 2] {
        [&self.top, &self.bottom]
    }

    /// Column widths wide enough for every header and cell of both tables.
    fn column_widths(&self) -> [usize; 5] {
        let mut widths = COLUMNS.map(|c| c.chars().count());
        for record in self.tables().into_iter().flat_map(|t| &t.rows) {
            for (width, cell) in widths.iter_mut().zip(RankingTable::cells(record)) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    /// Format as a fixed-width text table for terminal output.
    pub fn to_ascii_table(&self) -> String {
        let widths = self.column_widths();
        let rule_len = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
        let [w0, w1, w2, w3, w4] = widths;

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", REPORT_TITLE));
        output.push_str(&"=".repeat(rule_len));
        output.push('\n');

        for table in self.tables() {
            output.push_str(&format!("\n{}\n", table.title));
            output.push_str(&"-".repeat(rule_len));
            output.push('\n');
            output.push_str(&format!(
                "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {:>w4$}\n",
                COLUMNS[0], COLUMNS[1], COLUMNS[2], COLUMNS[3], COLUMNS[4]
            ));
            output.push_str(&"-".repeat(rule_len));
            output.push('\n');

            if table.rows.is_empty() {
                output.push_str("(no performers)\n");
                continue;
            }

            for record in &table.rows {
                let [symbol, name, sector, industry, ret] = RankingTable::cells(record);
                output.push_str(&format!(
                    "{symbol:<w0$}  {name:<w1$}  {sector:<w2$}  {industry:<w3$}  {ret:>w4$}\n"
                ));
            }
        }

        output
    }

    /// Format as Markdown tables for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", REPORT_TITLE));

        for table in self.tables() {
            output.push_str(&format!("## {}\n\n", table.title));

            if table.rows.is_empty() {
                output.push_str("_No performers._\n\n");
                continue;
            }

            output.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
            output.push_str("|---|---|---|---|---:|\n");
            for record in &table.rows {
                let cells = RankingTable::cells(record).map(|c| c.replace('|', "\\|"));
                output.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
            output.push('\n');
        }

        output
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RankingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}
