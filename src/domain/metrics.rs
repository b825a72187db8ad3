//! Performance metrics against a buy-and-hold benchmark.

use super::backtest::PortfolioSnapshot;
use super::error::SigtraderError;
use super::ledger::Trade;

/// Periods per year used to annualise the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

pub const MIN_SNAPSHOTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_cash: f64,
    pub final_portfolio_value: f64,
    pub total_return: f64,
    pub buy_hold_return: f64,
    pub alpha: f64,
    /// Non-finite when per-period returns have zero spread.
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline, as a fraction `<= 0`.
    pub max_drawdown: f64,
    pub total_trades: usize,
}

impl Metrics {
    pub fn analyze(
        snapshots: &[PortfolioSnapshot],
        trades: &[Trade],
        initial_cash: f64,
    ) -> Result<Self, SigtraderError> {
        let (first, last) = match (snapshots.first(), snapshots.last()) {
            (Some(f), Some(l)) if snapshots.len() >= MIN_SNAPSHOTS => (f, l),
            _ => {
                return Err(SigtraderError::InsufficientData {
                    snapshots: snapshots.len(),
                    minimum: MIN_SNAPSHOTS,
                })
            }
        };

        let total_return = last.portfolio_value / initial_cash - 1.0;
        let buy_hold_return = last.price / first.price - 1.0;

        let values: Vec<f64> = snapshots.iter().map(|s| s.portfolio_value).collect();

        Ok(Metrics {
            initial_cash,
            final_portfolio_value: last.portfolio_value,
            total_return,
            buy_hold_return,
            alpha: total_return - buy_hold_return,
            sharpe_ratio: sharpe_ratio(&period_returns(&values)),
            max_drawdown: max_drawdown(&values),
            total_trades: trades.len(),
        })
    }

    pub fn beat_benchmark(&self) -> bool {
        self.alpha > 0.0
    }
}

/// `v[i] / v[i-1] - 1` for each consecutive pair.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Annualised mean/stddev of `returns`, with the sample (n-1) stddev.
///
/// Zero spread, or a single return, gives a non-finite ratio.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    mean / variance.sqrt() * PERIODS_PER_YEAR.sqrt()
}

/// Minimum of `(v - running_peak) / running_peak`; `0.0` for an empty curve.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        let dd = (v - peak) / peak;
        if dd < worst {
            worst = dd;
        }
    }
    worst
}
