//! Synthetic price series shared by the component test suites.

use chrono::NaiveDate;

use crate::data::{InMemoryPriceHistory, PriceBar, PriceSeries};
use crate::symbols::SymbolTable;

/// First bar date for every synthetic series.
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

fn bar(day_offset: u64, close: f64) -> PriceBar {
    let date = start_date() + chrono::Days::new(day_offset);
    PriceBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

/// A series holding the same price for `length` bars.
pub fn flat_series(symbol: &str, length: usize, price: f64) -> PriceSeries {
    let bars = (0..length).map(|i| bar(i as u64, price)).collect();
    PriceSeries::new(symbol, bars)
}

/// Linear ramp up for `rise` bars, then linear ramp down for `fall` bars.
///
/// The up-slope adds one unit per bar from `base`; the down-slope sheds
/// `fall_slope` units per bar but never goes below one.
pub fn tent_series(symbol: &str, base: f64, rise: usize, fall: usize, fall_slope: f64) -> PriceSeries {
    let peak = base + rise as f64;
    let mut bars = Vec::with_capacity(rise + fall);
    for i in 0..rise {
        bars.push(bar(i as u64, base + i as f64));
    }
    for i in 0..fall {
        let price = (peak - (i + 1) as f64 * fall_slope).max(1.0);
        bars.push(bar((rise + i) as u64, price));
    }
    PriceSeries::new(symbol, bars)
}

/// A gently trending series with a mild oscillation, useful when the test
/// just needs "plausible" market data.
pub fn trending_series(symbol: &str, length: usize) -> PriceSeries {
    let bars = (0..length)
        .map(|i| {
            let drift = 100.0 + i as f64 * 0.25;
            let wave = (i as f64 * 0.17).sin() * 2.0;
            bar(i as u64, drift + wave)
        })
        .collect();
    PriceSeries::new(symbol, bars)
}

/// Provider with trending history for every symbol in the table.
pub fn full_history(symbols: &SymbolTable, length: usize) -> InMemoryPriceHistory {
    let mut provider = InMemoryPriceHistory::new();
    for (symbol, _) in symbols.iter() {
        provider.insert(trending_series(symbol, length));
    }
    provider
}
