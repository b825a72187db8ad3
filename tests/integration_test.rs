//! Integration tests for the backtest pipeline.
//!
//! Tests cover:
//! - End-to-end buy/hold/sell walkthrough with known metrics
//! - Pipeline orchestration through `run_backtest_pipeline`
//! - Oracle failures and deadlines degrading to hold
//! - Missing data and too-short calendars
//! - Weekly calendar priced at the nearest trading day
//! - CSV price files and replayed decisions on disk

mod common;

use approx::assert_relative_eq;
use common::*;
use sigtrader::adapters::csv_adapter::CsvAdapter;
use sigtrader::adapters::replay_oracle::ReplayOracle;
use sigtrader::adapters::timeout_oracle::TimeoutOracle;
use sigtrader::cli::run_backtest_pipeline;
use sigtrader::domain::backtest::{run_backtest, BacktestConfig};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::ledger::TradeSide;
use sigtrader::domain::metrics::Metrics;
use sigtrader::domain::price_series::PriceSeries;
use sigtrader::domain::schedule::Frequency;
use sigtrader::domain::signal::{Action, DecisionPayload};
use sigtrader::ports::oracle_port::DecisionOracle;
use std::sync::Arc;
use std::time::Duration;

fn three_day_port() -> MockPriceDataPort {
    MockPriceDataPort::new().with_bars(
        "AAPL",
        vec![
            make_bar("AAPL", "2024-01-01", 100.0),
            make_bar("AAPL", "2024-01-02", 110.0),
            make_bar("AAPL", "2024-01-03", 90.0),
        ],
    )
}

fn buy_hold_sell() -> ScriptedOracle {
    ScriptedOracle::new()
        .answer(date(2024, 1, 1), "Strong BUY signal")
        .answer(date(2024, 1, 2), "hold steady")
        .answer(date(2024, 1, 3), "time to sell")
}

mod end_to_end {
    use super::*;

    #[test]
    fn buy_hold_sell_walkthrough() {
        let port = three_day_port();
        let oracle = buy_hold_sell();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let series = PriceSeries::load(&port, "AAPL", config.start_date, config.end_date).unwrap();
        let result = run_backtest(&config, &series, &oracle).unwrap();

        let actions: Vec<Action> = result.snapshots.iter().map(|s| s.action).collect();
        assert_eq!(actions, vec![Action::Buy, Action::Hold, Action::Sell]);

        let values: Vec<f64> = result.snapshots.iter().map(|s| s.portfolio_value).collect();
        assert_relative_eq!(values[0], 1000.0);
        assert_relative_eq!(values[1], 1100.0);
        assert_relative_eq!(values[2], 900.0);

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].side, TradeSide::Buy);
        assert_eq!(result.trades[0].shares, 10);
        assert_eq!(result.trades[1].side, TradeSide::Sell);
        assert_eq!(result.oracle_failures, 0);

        let last = result.snapshots.last().unwrap();
        assert_eq!(last.shares, 0);
        assert_relative_eq!(last.cash, 900.0);

        let metrics = Metrics::analyze(&result.snapshots, &result.trades, 1000.0).unwrap();
        assert_relative_eq!(metrics.total_return, -0.10, epsilon = 1e-12);
        assert_relative_eq!(metrics.buy_hold_return, -0.10, epsilon = 1e-12);
        assert_relative_eq!(metrics.alpha, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.max_drawdown, 900.0 / 1100.0 - 1.0, epsilon = 1e-12);
        assert_eq!(metrics.total_trades, 2);
        assert!(!metrics.beat_benchmark());
    }

    #[test]
    fn oracle_is_asked_once_per_date_in_order() {
        let port = three_day_port();
        let oracle = buy_hold_sell();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let series = PriceSeries::load(&port, "AAPL", config.start_date, config.end_date).unwrap();
        run_backtest(&config, &series, &oracle).unwrap();

        assert_eq!(
            *oracle.calls.borrow(),
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn pipeline_reports_result_and_metrics() {
        let port = three_day_port();
        let oracle = buy_hold_sell();
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let (result, metrics) = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap();

        let written = report.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, result);
        assert_eq!(written[0].1, metrics);
        assert_relative_eq!(metrics.final_portfolio_value, 900.0);
    }

    #[test]
    fn missing_symbol_is_data_unavailable() {
        let port = MockPriceDataPort::new();
        let oracle = ScriptedOracle::new();
        let report = CapturingReport::default();
        let config = daily_config("NOPE", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let err = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap_err();
        assert!(matches!(err, SigtraderError::DataUnavailable { .. }));
        assert!(report.written.borrow().is_empty());
        assert!(oracle.calls.borrow().is_empty());
    }

    #[test]
    fn port_error_is_data_unavailable() {
        let port = MockPriceDataPort::new().with_error("AAPL", "feed offline");
        let oracle = ScriptedOracle::new();
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let err = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap_err();
        assert!(matches!(err, SigtraderError::DataUnavailable { .. }));
    }

    #[test]
    fn single_date_is_insufficient_for_metrics() {
        let port = three_day_port();
        let oracle = ScriptedOracle::new().answer(date(2024, 1, 2), "buy");
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 2), date(2024, 1, 2), 1000.0);

        let err = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::InsufficientData {
                snapshots: 1,
                minimum: 2
            }
        ));
        assert!(report.written.borrow().is_empty());
    }
}

mod oracle_failures {
    use super::*;

    #[test]
    fn failed_calls_become_holds() {
        let port = three_day_port();
        let oracle = ScriptedOracle::new()
            .answer(date(2024, 1, 1), "buy")
            .fail(date(2024, 1, 2), "rate limited");
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let (result, metrics) = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap();

        assert_eq!(result.oracle_failures, 2);
        assert_eq!(result.snapshots[1].action, Action::Hold);
        assert_eq!(result.snapshots[2].action, Action::Hold);
        // still holding the shares bought on day one
        assert_eq!(result.snapshots[2].shares, 10);
        assert_relative_eq!(metrics.total_return, -0.10, epsilon = 1e-12);
        assert_eq!(metrics.total_trades, 1);
    }

    struct Sleepy;

    impl DecisionOracle for Sleepy {
        fn decide(
            &self,
            _symbol: &str,
            date: chrono::NaiveDate,
        ) -> Result<DecisionPayload, SigtraderError> {
            if date == crate::common::date(2024, 1, 2) {
                std::thread::sleep(Duration::from_millis(500));
            }
            Ok(DecisionPayload::from("buy"))
        }
    }

    #[test]
    fn slow_call_past_deadline_is_hold() {
        let port = three_day_port();
        let oracle = TimeoutOracle::new(Arc::new(Sleepy), Duration::from_millis(50));
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let (result, _) = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap();

        // day three is skipped while the abandoned day-two call is still running
        assert_eq!(result.oracle_failures, 2);
        let actions: Vec<Action> = result.snapshots.iter().map(|s| s.action).collect();
        assert_eq!(actions, vec![Action::Buy, Action::Hold, Action::Hold]);
        assert_eq!(result.snapshots[2].shares, 10);
    }
}

mod weekly_calendar {
    use super::*;

    #[test]
    fn sundays_priced_at_nearest_trading_day() {
        let bars = generate_weekday_bars("MSFT", date(2024, 1, 1), 21, 100.0, 1.0);
        let port = MockPriceDataPort::new().with_bars("MSFT", bars);
        let oracle = ScriptedOracle::new()
            .answer(date(2024, 1, 7), "hold")
            .answer(date(2024, 1, 14), "hold")
            .answer(date(2024, 1, 21), "hold");
        let report = CapturingReport::default();
        let config = BacktestConfig {
            symbol: "MSFT".into(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 21),
            initial_cash: 5000.0,
            frequency: Frequency::Weekly,
        };

        let (result, metrics) = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap();

        let dates: Vec<_> = result.snapshots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 7), date(2024, 1, 14), date(2024, 1, 21)]);
        assert_eq!(result.period, Some((date(2024, 1, 1), date(2024, 1, 21))));

        // Sun 7th -> Mon 8th, Sun 14th -> Mon 15th, Sun 21st -> Fri 19th
        let prices: Vec<f64> = result.snapshots.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![105.0, 110.0, 114.0]);

        assert_relative_eq!(metrics.total_return, 0.0);
        assert_relative_eq!(metrics.buy_hold_return, 114.0 / 105.0 - 1.0, epsilon = 1e-12);
        assert_eq!(metrics.total_trades, 0);
    }
}

mod files_on_disk {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn csv_prices_and_replayed_decisions() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("AAPL.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-03,91,92,89,90,1000\n\
             2024-01-01,99,101,98,100,1000\n\
             2024-01-02,109,111,108,110,1000\n",
        )
        .unwrap();
        let decisions = dir.path().join("decisions.csv");
        fs::write(
            &decisions,
            "date,decision\n\
             2024-01-01,\"FINAL TRANSACTION PROPOSAL: **BUY**\"\n\
             2024-01-02,HOLD\n\
             2024-01-03,\"Sell, margins are shrinking\"\n",
        )
        .unwrap();

        let port = CsvAdapter::new(dir.path().to_path_buf());
        let oracle = ReplayOracle::from_file(&decisions).unwrap();
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let (result, metrics) = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap();

        let actions: Vec<Action> = result.snapshots.iter().map(|s| s.action).collect();
        assert_eq!(actions, vec![Action::Buy, Action::Hold, Action::Sell]);
        assert_relative_eq!(metrics.total_return, -0.10, epsilon = 1e-12);
        assert_relative_eq!(metrics.alpha, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_csv_file_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let port = CsvAdapter::new(dir.path().to_path_buf());
        let oracle = ReplayOracle::default();
        let report = CapturingReport::default();
        let config = daily_config("AAPL", date(2024, 1, 1), date(2024, 1, 3), 1000.0);

        let err = run_backtest_pipeline(&port, &oracle, &config, &report).unwrap_err();
        assert!(matches!(err, SigtraderError::DataUnavailable { .. }));
    }
}
