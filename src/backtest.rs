//! Moving-average crossover backtest simulator.
//!
//! One call replays a single genome over a single symbol's daily history and
//! produces an equity curve, discrete entry/exit signals and summary
//! metrics. The simulator is a pure function of its inputs: no ambient
//! state, no I/O, no randomness, so any number of agents can be simulated
//! concurrently over shared immutable price data.
//!
//! Only the most recent [`BACKTEST_WINDOW_BARS`] bars are used so every
//! asset is compared over an equal, recent window and multi-year compounding
//! cannot dominate the scores.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::PriceSeries;
use crate::errors::Result;
use crate::fitness::{compute_fitness, overfit_penalty};
use crate::genome::Genome;

/// Default starting capital for a simulation run.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Number of most-recent bars replayed, roughly two years of daily data.
pub const BACKTEST_WINDOW_BARS: usize = 730;

/// Minimum usable bars below which the simulation is skipped.
pub const MIN_BARS: usize = 50;

/// Rebalancing is suppressed while the exposure delta stays inside this
/// band, so noise-level signal changes do not churn the position.
const REBALANCE_BAND: f64 = 0.01;

/// A position whose market value falls below this fraction of equity is
/// closed in full and the round-trip is classified as a win or loss.
const CLOSEOUT_FRACTION: f64 = 0.005;

/// Annualization factor for daily Sharpe ratios.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Tunable simulation parameters.
#[derive(Debug, Clone, Copy)]
pub struct BacktestConfig {
    /// Starting cash for the run.
    pub initial_capital: f64,
    /// Maximum number of most-recent bars replayed.
    pub window_bars: usize,
    /// Minimum usable bars required to simulate at all.
    pub min_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            window_bars: BACKTEST_WINDOW_BARS,
            min_bars: MIN_BARS,
        }
    }
}

/// Direction of a recorded trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    /// Golden cross: the fast average rose above the slow average.
    Entry,
    /// Death cross: the fast average fell back to or below the slow average.
    Exit,
}

/// One discrete crossover event observed during the replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Bar date the signal fired on.
    pub date: NaiveDate,
    /// Closing price at the signal bar.
    pub price: f64,
    /// Entry or exit.
    pub action: SignalAction,
    /// Target exposure fraction implied by the signal.
    pub exposure: f64,
}

/// Equity at the end of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Bar date.
    pub date: NaiveDate,
    /// Account equity (cash plus position value).
    pub equity: f64,
}

/// Immutable outcome of one completed simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Total return over the window, in percent.
    pub total_return: f64,
    /// Annualized Sharpe ratio of daily equity returns.
    pub sharpe: f64,
    /// Maximum percentage drawdown from the running equity peak.
    pub max_drawdown: f64,
    /// Percentage of completed round-trips that ended above entry equity.
    pub win_rate: f64,
    /// Number of recorded crossover signals.
    pub trade_count: usize,
    /// Composite fitness in `[0, 100]`, overfitting penalty included.
    pub fitness: f64,
    /// End-of-bar equity for every replayed bar.
    pub equity_curve: Vec<EquityPoint>,
    /// Crossover events in chronological order.
    pub trade_signals: Vec<TradeSignal>,
    /// Fast moving-average period actually used, in days.
    pub fast_period: usize,
    /// Slow moving-average period actually used, after degeneracy correction.
    pub slow_period: usize,
    /// Symbol the simulation ran against.
    pub asset: String,
}

/// Outcome of a simulation request.
///
/// A short history is not an error: the agent simply keeps its previous
/// metrics for the cycle. The distinction is explicit so callers can tell a
/// fresh result from a retained one.
#[derive(Debug, Clone)]
pub enum BacktestOutcome {
    /// The simulation ran and produced a fresh result.
    Completed(BacktestResult),
    /// Too few usable bars; prior metrics remain in effect.
    Unchanged {
        /// Bars that were actually available.
        available_bars: usize,
    },
}

impl BacktestOutcome {
    /// The fresh result, if the simulation ran.
    pub fn completed(self) -> Option<BacktestResult> {
        match self {
            BacktestOutcome::Completed(result) => Some(result),
            BacktestOutcome::Unchanged { .. } => None,
        }
    }

    /// Whether prior metrics were retained.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, BacktestOutcome::Unchanged { .. })
    }
}

/// Replay `genome` over `series` and score the outcome.
///
/// Returns [`BacktestOutcome::Unchanged`] when fewer than the configured
/// minimum bars are available. The only hard error is a malformed genome,
/// which indicates a violated precondition elsewhere.
pub fn run_backtest(
    genome: &Genome,
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestOutcome> {
    genome.validate()?;

    if series.len() < config.min_bars {
        return Ok(BacktestOutcome::Unchanged {
            available_bars: series.len(),
        });
    }

    let window = series.recent_window(config.window_bars);
    let fast_period = genome.fast_period();
    let slow_period = correct_slow_period(fast_period, genome.slow_period());

    let closes: Vec<f64> = window.iter().map(|bar| bar.close).collect();
    let sums = prefix_sums(&closes);

    let mut cash = config.initial_capital;
    let mut units = 0.0f64;
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(window.len());
    let mut trade_signals: Vec<TradeSignal> = Vec::new();

    let mut peak_equity = config.initial_capital;
    let mut max_drawdown = 0.0f64;
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut entry_equity: Option<f64> = None;
    // The state before the averages exist counts as "fast at or below slow",
    // so the first bar where fast pulls ahead registers as a golden cross.
    let mut fast_was_above = false;

    for (index, bar) in window.iter().enumerate() {
        let price = bar.close;
        let equity = cash + units * price;

        if let (Some(fast_sma), Some(slow_sma)) = (
            sma_at(&sums, index, fast_period),
            sma_at(&sums, index, slow_period),
        ) {
            let fast_is_above = fast_sma > slow_sma;

            let target = if fast_is_above && slow_sma > 0.0 {
                let strength = (fast_sma - slow_sma) / slow_sma;
                (1.0 - genome.risk_aversion) * (strength * 15.0).tanh() * 0.99
            } else {
                0.0
            };

            if fast_is_above && !fast_was_above {
                trade_signals.push(TradeSignal {
                    date: bar.date,
                    price,
                    action: SignalAction::Entry,
                    exposure: target,
                });
            } else if !fast_is_above && fast_was_above {
                trade_signals.push(TradeSignal {
                    date: bar.date,
                    price,
                    action: SignalAction::Exit,
                    exposure: 0.0,
                });
            }
            fast_was_above = fast_is_above;

            // Rebalance toward the target, ignoring noise-level deltas.
            if equity > 0.0 && price > 0.0 {
                let current = (units * price) / equity;
                let delta = target - current;
                if delta.abs() > REBALANCE_BAND {
                    if current == 0.0 && delta > 0.0 {
                        entry_equity = Some(equity);
                    }
                    let trade_value = delta * equity;
                    units += trade_value / price;
                    cash -= trade_value;
                }
            }

            // Flush dust positions and settle the round-trip. The marker is
            // the gate so a rebalance that lands exactly on zero units still
            // closes the trip.
            if entry_equity.is_some() && units * price < CLOSEOUT_FRACTION * equity {
                cash += units * price;
                units = 0.0;
                if let Some(opened_at) = entry_equity.take() {
                    if equity > opened_at {
                        wins += 1;
                    } else {
                        losses += 1;
                    }
                }
            }
        }

        let end_of_bar_equity = cash + units * price;
        if end_of_bar_equity > peak_equity {
            peak_equity = end_of_bar_equity;
        }
        if peak_equity > 0.0 {
            let drawdown = (peak_equity - end_of_bar_equity) / peak_equity * 100.0;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: end_of_bar_equity,
        });
    }

    let final_equity = equity_curve
        .last()
        .map(|point| point.equity)
        .unwrap_or(config.initial_capital);
    let total_return = (final_equity - config.initial_capital) / config.initial_capital * 100.0;
    let sharpe = annualized_sharpe(&equity_curve);
    let completed_trips = wins + losses;
    let win_rate = if completed_trips > 0 {
        wins as f64 / completed_trips as f64 * 100.0
    } else {
        0.0
    };

    let fitness = compute_fitness(sharpe, total_return, win_rate, max_drawdown)
        * overfit_penalty(&equity_curve);

    Ok(BacktestOutcome::Completed(BacktestResult {
        total_return,
        sharpe,
        max_drawdown,
        win_rate,
        trade_count: trade_signals.len(),
        fitness,
        equity_curve,
        trade_signals,
        fast_period,
        slow_period,
        asset: series.symbol.clone(),
    }))
}

/// A degenerate genome where the fast period reaches the slow period is
/// corrected by pushing the slow period out, never by failing the run.
fn correct_slow_period(fast_period: usize, slow_period: usize) -> usize {
    if fast_period >= slow_period {
        let bump = ((fast_period as f64) * 0.25).ceil() as usize;
        fast_period + bump.max(10)
    } else {
        slow_period
    }
}

/// Cumulative sums with a leading zero, built in one pass.
fn prefix_sums(values: &[f64]) -> Vec<f64> {
    let mut sums = Vec::with_capacity(values.len() + 1);
    sums.push(0.0);
    let mut running = 0.0;
    for &value in values {
        running += value;
        sums.push(running);
    }
    sums
}

/// Simple moving average ending at `index`, `None` until enough bars exist.
fn sma_at(sums: &[f64], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index + 1 < period {
        return None;
    }
    let window_sum = sums[index + 1] - sums[index + 1 - period];
    Some(window_sum / period as f64)
}

/// Annualized Sharpe ratio of day-over-day equity returns.
///
/// Day zero contributes no return sample. Fewer than three samples or zero
/// variance resolve to zero rather than propagating NaN into fitness.
fn annualized_sharpe(equity_curve: &[EquityPoint]) -> f64 {
    let mut returns = Vec::with_capacity(equity_curve.len().saturating_sub(1));
    for pair in equity_curve.windows(2) {
        let previous = pair[0].equity;
        if previous > 0.0 {
            returns.push(pair[1].equity / previous - 1.0);
        }
    }

    if returns.len() < 3 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 0.0;
    }

    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_period_correction_keeps_fast_below_slow() {
        assert_eq!(correct_slow_period(5, 20), 20);
        // Equal periods bump by the 10-day floor.
        assert_eq!(correct_slow_period(20, 20), 30);
        // Large fast periods bump by a quarter of their own length.
        assert_eq!(correct_slow_period(50, 20), 63);
        for fast in 5..=50 {
            for slow in 20..=60 {
                assert!(fast < correct_slow_period(fast, slow));
            }
        }
    }

    #[test]
    fn prefix_sum_sma_matches_naive_average() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let sums = prefix_sums(&closes);

        assert_eq!(sma_at(&sums, 1, 3), None);
        assert_eq!(sma_at(&sums, 2, 3), Some(2.0));
        assert_eq!(sma_at(&sums, 5, 3), Some(5.0));
        assert_eq!(sma_at(&sums, 5, 6), Some(3.5));
    }

    #[test]
    fn sharpe_is_zero_without_enough_samples_or_variance() {
        let date = |day| chrono::NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let flat: Vec<EquityPoint> = (1..=10)
            .map(|day| EquityPoint {
                date: date(day),
                equity: 100.0,
            })
            .collect();
        assert_eq!(annualized_sharpe(&flat), 0.0);

        let short = vec![
            EquityPoint {
                date: date(1),
                equity: 100.0,
            },
            EquityPoint {
                date: date(2),
                equity: 101.0,
            },
        ];
        assert_eq!(annualized_sharpe(&short), 0.0);
    }
}
