//! Integration tests for ranking reports and exports.

use chrono::NaiveDate;
use movers::{Constituent, ConstituentDirectory, PriceMatrix, PriceSeries, ReturnRanker};
use movers_output::{ExportFormat, ExportRow, Exporter, RankingReport};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
}

#[test]
fn test_full_report_workflow() {
    let sectors = ["Energy", "Financials", "Health Care", "Utilities"];
    let mut constituents = Vec::new();
    let mut series = Vec::new();
    for i in 0..24u32 {
        let symbol = format!("T{i:02}");
        constituents.push(Constituent::new(
            symbol.clone(),
            format!("Company {i}"),
            sectors[i as usize % sectors.len()],
            "Diversified",
        ));
        // Returns run from -12% to +11% in whole percent steps.
        let end = 100.0 + f64::from(i) - 12.0;
        series.push(PriceSeries::from_points(symbol, [(d(8), 100.0), (d(9), end)]));
    }

    let directory = ConstituentDirectory::new(constituents);
    let prices = PriceMatrix::from_series(series);
    let ranking = ReturnRanker::new()
        .rank(&prices, &directory, d(8), d(9))
        .unwrap();
    let report = RankingReport::from_ranking(&ranking);

    let ascii = report.to_ascii_table();
    assert!(ascii.contains("Top 10 Performers from 2024-08-08 to 2024-08-09"));
    assert!(ascii.contains("Bottom 10 Performers from 2024-08-08 to 2024-08-09"));
    assert!(ascii.contains("Company 23"));
    assert!(ascii.contains("-12.00"));

    let markdown = report.to_markdown();
    let data_rows = markdown
        .lines()
        .filter(|l| l.starts_with("| T") && !l.starts_with("| Ticker"))
        .count();
    assert_eq!(data_rows, 20);

    let csv = report.export_to_string(ExportFormat::Csv).unwrap();
    let rows: Vec<ExportRow> = csv::Reader::from_reader(csv.as_bytes())
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[0].symbol, "T23");
    assert_eq!(rows[0].return_pct, 11.0);
    assert_eq!(rows[10].list, "bottom");
    assert_eq!(rows[10].rank, 1);
    assert_eq!(rows[10].symbol, "T09");
    assert_eq!(rows[19].symbol, "T00");
    assert_eq!(rows[19].return_pct, -12.0);
}

#[test]
fn test_report_json_export() {
    let directory = ConstituentDirectory::new(vec![Constituent::new(
        "XOM",
        "Exxon Mobil",
        "Energy",
        "Integrated Oil & Gas",
    )]);
    let prices = PriceMatrix::from_series([PriceSeries::from_points(
        "XOM",
        [(d(8), 115.0), (d(9), 115.0)],
    )]);
    let ranking = ReturnRanker::new()
        .rank(&prices, &directory, d(8), d(9))
        .unwrap();

    let json = RankingReport::from_ranking(&ranking)
        .export_to_string(ExportFormat::PrettyJson)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["top"]["rows"][0]["symbol"], "XOM");
    assert_eq!(value["bottom"]["rows"][0]["return_pct"], 0.0);
}
