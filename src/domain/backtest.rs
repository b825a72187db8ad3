//! Backtest engine and rebalancing loop.
//!
//! One pass over the rebalancing dates in ascending order. Each step reads
//! the ledger left by the previous step, so steps never run out of order.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::error::SigtraderError;
use super::ledger::{Ledger, Trade};
use super::price_series::PriceSeries;
use super::schedule::{rebalance_dates, Frequency};
use super::signal::{interpret, Action};
use crate::ports::oracle_port::DecisionOracle;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub frequency: Frequency,
}

/// Post-trade state recorded on each rebalancing date.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub cash: f64,
    pub shares: u64,
    pub portfolio_value: f64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    /// Requested `(start, end)` range, which may be wider than the dates
    /// actually rebalanced.
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub initial_cash: f64,
    pub snapshots: Vec<PortfolioSnapshot>,
    pub trades: Vec<Trade>,
    pub oracle_failures: usize,
}

impl BacktestResult {
    pub fn final_value(&self) -> Option<f64> {
        self.snapshots.last().map(|s| s.portfolio_value)
    }
}

/// Run a backtest over the configured rebalancing calendar.
pub fn run_backtest(
    config: &BacktestConfig,
    series: &PriceSeries,
    oracle: &dyn DecisionOracle,
) -> Result<BacktestResult, SigtraderError> {
    let dates = rebalance_dates(config.start_date, config.end_date, config.frequency);
    info!(
        symbol = %config.symbol,
        start = %config.start_date,
        end = %config.end_date,
        frequency = %config.frequency,
        dates = dates.len(),
        "running backtest"
    );
    let mut result = run_schedule(&config.symbol, &dates, config.initial_cash, series, oracle)?;
    result.period = Some((config.start_date, config.end_date));
    Ok(result)
}

/// Run the simulation over an explicit list of rebalancing dates.
///
/// `dates` must be ascending. Fails only when a price cannot be resolved,
/// which cannot happen for a non-empty series.
pub fn run_schedule(
    symbol: &str,
    dates: &[NaiveDate],
    initial_cash: f64,
    series: &PriceSeries,
    oracle: &dyn DecisionOracle,
) -> Result<BacktestResult, SigtraderError> {
    debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));

    let mut ledger = Ledger::new(initial_cash);
    let mut snapshots = Vec::with_capacity(dates.len());
    let mut oracle_failures = 0usize;

    for &date in dates {
        let price = series.closing_price(date)?;

        let action = match oracle.decide(symbol, date) {
            Ok(payload) => interpret(&payload),
            Err(e) => {
                warn!(%date, error = %e, "oracle failed, holding");
                oracle_failures += 1;
                Action::Hold
            }
        };

        let snapshot = rebalance(&mut ledger, date, price, action);
        info!(
            %date,
            price = format_args!("{:.2}", price),
            %action,
            value = format_args!("{:.2}", snapshot.portfolio_value),
            cash = format_args!("{:.2}", snapshot.cash),
            shares = snapshot.shares,
            "processed"
        );
        snapshots.push(snapshot);
    }

    Ok(BacktestResult {
        symbol: symbol.to_string(),
        period: dates.first().zip(dates.last()).map(|(&a, &b)| (a, b)),
        initial_cash,
        snapshots,
        trades: ledger.into_trades(),
        oracle_failures,
    })
}

/// Apply one action to the ledger and snapshot the result.
pub fn rebalance(
    ledger: &mut Ledger,
    date: NaiveDate,
    price: f64,
    action: Action,
) -> PortfolioSnapshot {
    match ledger.execute(action, price, date) {
        Some(trade) => debug!(
            %date,
            side = %trade.side,
            shares = trade.shares,
            cash_flow = trade.cash_flow,
            "trade executed"
        ),
        None if action != Action::Hold => debug!(%date, %action, "nothing to trade"),
        None => {}
    }

    PortfolioSnapshot {
        date,
        price,
        cash: ledger.cash(),
        shares: ledger.shares(),
        portfolio_value: ledger.value_at(price),
        action,
    }
}
