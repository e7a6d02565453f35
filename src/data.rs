//! Price history records consumed by the backtest simulator.
//!
//! The engine never fetches data itself. Daily bars arrive from an external
//! collaborator through the [`PriceHistoryProvider`] trait, one series per
//! symbol, ordered by date ascending. Malformed rows (non-numeric or
//! non-positive close prices) are dropped at ingestion time so the simulator
//! only ever sees usable bars; gaps in the calendar are tolerated downstream.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;

/// One daily OHLCV bar for a single symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Calendar day of the bar.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price of the day.
    pub high: f64,
    /// Lowest price of the day.
    pub low: f64,
    /// Closing price. Always finite and positive after ingestion.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

/// Date-ascending series of daily bars for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Symbol the bars belong to (e.g. "BTC").
    pub symbol: String,
    /// Bars ordered by date ascending.
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a series from pre-validated bars, sorting them by date.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// Number of bars in the series.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series contains no bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent `count` bars, or the whole series if shorter.
    pub fn recent_window(&self, count: usize) -> &[PriceBar] {
        if self.bars.len() > count {
            &self.bars[self.bars.len() - count..]
        } else {
            &self.bars
        }
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Read a series from CSV with a `date,open,high,low,close,volume` header.
    ///
    /// Rows that fail to deserialize, carry an unparseable date, or have a
    /// non-finite or non-positive close are skipped. Reader-level failures
    /// (I/O, broken framing) still surface as errors.
    pub fn from_csv_reader<R: std::io::Read>(symbol: impl Into<String>, reader: R) -> Result<Self> {
        #[derive(Deserialize)]
        struct Row {
            date: String,
            open: f64,
            high: f64,
            low: f64,
            close: f64,
            volume: f64,
        }

        let symbol = symbol.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for record in csv_reader.deserialize::<Row>() {
            let row = match record {
                Ok(row) => row,
                Err(err) if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) => {
                    skipped += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let Ok(date) = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") else {
                skipped += 1;
                continue;
            };
            if !row.close.is_finite() || row.close <= 0.0 {
                skipped += 1;
                continue;
            }

            bars.push(PriceBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        if skipped > 0 {
            debug!(symbol = %symbol, skipped, "dropped unusable rows during ingestion");
        }

        Ok(Self::new(symbol, bars))
    }

    /// Read a series from a CSV file on disk.
    pub fn from_csv_path(symbol: impl Into<String>, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(symbol, file)
    }
}

/// Read-only source of historical bars keyed by symbol.
///
/// A provider may be missing a symbol entirely or hold fewer bars than the
/// simulator minimum; callers degrade by skipping the affected agent's
/// update instead of failing the cycle.
pub trait PriceHistoryProvider {
    /// Bars for `symbol`, or `None` when the symbol has no history.
    fn bars(&self, symbol: &str) -> Option<&PriceSeries>;
}

/// Simple map-backed provider used by tests and embedders that preload data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceHistory {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceHistory {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the series for its symbol.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol.clone(), series);
    }

    /// Number of symbols with stored history.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the provider holds no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PriceHistoryProvider for InMemoryPriceHistory {
    fn bars(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_skips_unusable_rows() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-01,10.0,11.0,9.5,10.5,1000\n\
                   2024-01-02,10.5,11.5,10.0,not-a-number,1000\n\
                   2024-01-03,10.5,11.5,10.0,-3.0,1000\n\
                   bad-date,10.5,11.5,10.0,10.8,1000\n\
                   2024-01-05,10.6,11.6,10.1,11.0,1200\n";

        let series = PriceSeries::from_csv_reader("BTC", csv.as_bytes()).expect("parse");
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].close, 10.5);
        assert_eq!(series.bars[1].close, 11.0);
    }

    #[test]
    fn series_sorts_bars_by_date() {
        let bar = |day: u32, close: f64| PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        };

        let series = PriceSeries::new("ETH", vec![bar(3, 3.0), bar(1, 1.0), bar(2, 2.0)]);
        let closes = series.closes();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn recent_window_trims_from_the_front() {
        let bars: Vec<PriceBar> = (1..=10)
            .map(|day| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                open: day as f64,
                high: day as f64,
                low: day as f64,
                close: day as f64,
                volume: 0.0,
            })
            .collect();
        let series = PriceSeries::new("SOL", bars);

        let window = series.recent_window(4);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].close, 7.0);
        assert_eq!(series.recent_window(50).len(), 10);
    }

    #[test]
    fn provider_returns_none_for_unknown_symbol() {
        let mut provider = InMemoryPriceHistory::new();
        provider.insert(PriceSeries::new("BTC", Vec::new()));

        assert!(provider.bars("BTC").is_some());
        assert!(provider.bars("DOGE").is_none());
    }
}
