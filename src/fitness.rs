//! Composite fitness scoring with an anti-overfitting adjustment.
//!
//! Raw backtest metrics are normalized to `[0, 1]`, blended with fixed
//! weights and scaled to `[0, 100]`. A separate multiplier derived from the
//! second half of the equity curve penalizes strategies whose edge collapses
//! late in the window, a cheap proxy for in-sample overfitting that needs no
//! held-out dataset.

use crate::backtest::EquityPoint;

const SHARPE_WEIGHT: f64 = 0.40;
const RETURN_WEIGHT: f64 = 0.30;
const WIN_RATE_WEIGHT: f64 = 0.20;
const DRAWDOWN_WEIGHT: f64 = 0.10;

/// Reduce raw metrics to a single bounded fitness value in `[0, 100]`.
///
/// Sharpe is clamped to `[-2, 4]`, total return to `[-50, 150]` percent and
/// drawdown to `[0, 60]` percent before normalization, so any finite inputs
/// produce a score inside the bounds.
pub fn compute_fitness(sharpe: f64, total_return: f64, win_rate: f64, max_drawdown: f64) -> f64 {
    let sharpe_score = (sharpe.clamp(-2.0, 4.0) + 2.0) / 6.0;
    let return_score = (total_return.clamp(-50.0, 150.0) + 50.0) / 200.0;
    let win_score = (win_rate / 100.0).clamp(0.0, 1.0);
    let drawdown_score = 1.0 - max_drawdown.clamp(0.0, 60.0) / 60.0;

    let blended = SHARPE_WEIGHT * sharpe_score
        + RETURN_WEIGHT * return_score
        + WIN_RATE_WEIGHT * win_score
        + DRAWDOWN_WEIGHT * drawdown_score;

    blended.clamp(0.0, 1.0) * 100.0
}

/// Fitness multiplier derived from second-half performance.
///
/// The equity curve is split at its midpoint index; a second-half return
/// below -20% halves the fitness, below -5% takes a quarter off, anything
/// else passes through unchanged.
pub fn overfit_penalty(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 1.0;
    }

    let mid_equity = equity_curve[equity_curve.len() / 2].equity;
    let final_equity = equity_curve[equity_curve.len() - 1].equity;
    if mid_equity <= 0.0 {
        return 1.0;
    }

    let second_half_return = (final_equity - mid_equity) / mid_equity;
    if second_half_return < -0.20 {
        0.50
    } else if second_half_return < -0.05 {
        0.75
    } else {
        1.0
    }
}
