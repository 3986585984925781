//! Conversion between quote frames and [`PriceSeries`].
//!
//! Quote frames have the columns `symbol` (str), `date` (Date) and
//! `adjusted_close` (f64), one row per trading day.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use movers::PriceSeries;
use polars::prelude::*;

/// Column names of a quote frame, in order.
pub const QUOTE_COLUMNS: [&str; 3] = ["symbol", "date", "adjusted_close"];

/// Build a quote frame from parallel date strings (`YYYY-MM-DD`) and prices.
pub fn quote_frame(symbol: &str, dates: Vec<String>, adj_closes: Vec<f64>) -> Result<DataFrame> {
    if dates.len() != adj_closes.len() {
        return Err(DataError::Parse(format!(
            "{} dates but {} prices for {}",
            dates.len(),
            adj_closes.len(),
            symbol
        )));
    }

    let df = DataFrame::new(vec![
        Series::new("symbol".into(), vec![symbol; dates.len()]).into(),
        Series::new("date".into(), dates).into(),
        Series::new("adjusted_close".into(), adj_closes).into(),
    ])?;

    let df = df
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;

    Ok(df)
}

/// Convert a [`PriceSeries`] into a quote frame.
pub fn series_to_frame(series: &PriceSeries) -> Result<DataFrame> {
    let dates = series.points().iter().map(|p| p.date.to_string()).collect();
    let prices = series.points().iter().map(|p| p.adjusted_close).collect();
    quote_frame(series.symbol(), dates, prices)
}

/// Extract one ticker's series from a quote frame.
///
/// Rows with a null date or price are skipped.
pub fn frame_to_series(symbol: &str, df: &DataFrame) -> Result<PriceSeries> {
    let dates = df.column("date")?.cast(&DataType::String)?;
    let dates = dates.str()?;
    let adj_closes = df.column("adjusted_close")?.f64()?;

    let mut points = Vec::with_capacity(df.height());
    for (date, price) in dates.into_iter().zip(adj_closes.into_iter()) {
        let (Some(date), Some(price)) = (date, price) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("Invalid date {:?}: {}", date, e)))?;
        points.push((date, price));
    }

    Ok(PriceSeries::from_points(symbol, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    #[test]
    fn test_series_frame_round_trip() {
        let series = PriceSeries::from_points("BRK-B", [(d(9), 421.5), (d(8), 418.25)]);

        let df = series_to_frame(&series).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), QUOTE_COLUMNS.to_vec());
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let back = frame_to_series("BRK-B", &df).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = quote_frame("A", vec!["2024-08-08".to_string()], vec![]);
        assert!(matches!(result, Err(DataError::Parse(_))));
    }
}
