//! Plain-text summary of a finished backtest, written to stdout.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::io::{self, Write};

const RULE_WIDTH: usize = 50;

#[derive(Debug, Default)]
pub struct ConsoleReportAdapter {
    pub show_trades: bool,
}

impl ConsoleReportAdapter {
    pub fn new(show_trades: bool) -> Self {
        Self { show_trades }
    }

    pub fn render(&self, result: &BacktestResult, metrics: &Metrics) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "BACKTEST RESULTS");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Symbol:                {}", result.symbol);
        if let Some((start, end)) = result.period {
            let _ = writeln!(out, "Period:                {} to {}", start, end);
        }
        let _ = writeln!(out, "Initial Investment:    ${:.2}", metrics.initial_cash);
        let _ = writeln!(out, "Final Portfolio Value: ${:.2}", metrics.final_portfolio_value);
        let _ = writeln!(out);
        let _ = writeln!(out, "Strategy Return:       {}", pct(metrics.total_return));
        let _ = writeln!(out, "Buy & Hold Return:     {}", pct(metrics.buy_hold_return));
        let _ = writeln!(out, "Alpha:                 {}", pct(metrics.alpha));
        let _ = writeln!(out);
        let _ = writeln!(out, "Sharpe Ratio:          {}", ratio(metrics.sharpe_ratio));
        let _ = writeln!(out, "Max Drawdown:          {}", pct(metrics.max_drawdown));
        let _ = writeln!(out, "Total Trades:          {}", metrics.total_trades);
        if result.oracle_failures > 0 {
            let _ = writeln!(out, "Oracle Failures:       {}", result.oracle_failures);
        }
        let _ = writeln!(out);

        if metrics.beat_benchmark() {
            let _ = writeln!(out, "Strategy BEAT buy-and-hold by {}", pct(metrics.alpha));
        } else {
            let _ = writeln!(
                out,
                "Strategy underperformed buy-and-hold by {}",
                pct(metrics.alpha.abs())
            );
        }

        if self.show_trades && !result.trades.is_empty() {
            let _ = writeln!(out, "\n=== Trades ===");
            for t in &result.trades {
                let _ = writeln!(
                    out,
                    "  {}  {:<4}  {:>8} @ {:>10.2}  = {:>12.2}",
                    t.date, t.side, t.shares, t.price, t.cash_flow
                );
            }
        }

        out
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "n/a".to_string()
    }
}

impl ReportPort for ConsoleReportAdapter {
    fn write(&self, result: &BacktestResult, metrics: &Metrics) -> Result<(), SigtraderError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(self.render(result, metrics).as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}
