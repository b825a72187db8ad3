//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::replay_oracle::ReplayOracle;
use crate::adapters::timeout_oracle::TimeoutOracle;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, BacktestResult, DEFAULT_INITIAL_CASH,
};
use crate::domain::config_validation::{
    optional_number, parse_date, validate_all, validate_backtest_config, validate_data_config,
    validate_oracle_config, DEFAULT_ORACLE_TIMEOUT_SECS,
};
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::price_series::PriceSeries;
use crate::domain::schedule::{rebalance_dates, Frequency};
use crate::ports::config_port::ConfigPort;
use crate::ports::oracle_port::DecisionOracle;
use crate::ports::price_data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Backtest an external trading-signal oracle", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Ticker (overrides [backtest] symbol)
        #[arg(long)]
        symbol: Option<String>,
        /// Start date, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date, YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Starting cash
        #[arg(long)]
        cash: Option<f64>,
        /// Rebalancing frequency: daily or weekly
        #[arg(long)]
        frequency: Option<Frequency>,
        /// Print the trade log after the summary
        #[arg(long)]
        trades: bool,
        /// Validate config and price data without calling the oracle
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the `[backtest]` section.
#[derive(Debug, Clone, Default)]
pub struct BacktestOverrides {
    pub symbol: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub cash: Option<f64>,
    pub frequency: Option<Frequency>,
}

/// A [`ConfigPort`] that layers overrides on top of another config.
pub struct OverlayConfig<'a> {
    base: &'a dyn ConfigPort,
    values: HashMap<(String, String), String>,
}

impl<'a> OverlayConfig<'a> {
    pub fn new(base: &'a dyn ConfigPort) -> Self {
        Self {
            base,
            values: HashMap::new(),
        }
    }

    pub fn with_overrides(base: &'a dyn ConfigPort, overrides: &BacktestOverrides) -> Self {
        let mut overlay = Self::new(base);
        if let Some(symbol) = &overrides.symbol {
            overlay.set("backtest", "symbol", symbol.clone());
        }
        if let Some(start) = overrides.start {
            overlay.set("backtest", "start_date", start.format("%Y-%m-%d").to_string());
        }
        if let Some(end) = overrides.end {
            overlay.set("backtest", "end_date", end.format("%Y-%m-%d").to_string());
        }
        if let Some(cash) = overrides.cash {
            overlay.set("backtest", "initial_cash", cash.to_string());
        }
        if let Some(frequency) = overrides.frequency {
            overlay.set("backtest", "frequency", frequency.to_string());
        }
        overlay
    }

    pub fn set(&mut self, section: &str, key: &str, value: String) {
        self.values
            .insert((section.to_string(), key.to_string()), value);
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&String> {
        self.values.get(&(section.to_string(), key.to_string()))
    }
}

impl ConfigPort for OverlayConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.lookup(section, key)
            .cloned()
            .or_else(|| self.base.get_string(section, key))
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            start,
            end,
            cash,
            frequency,
            trades,
            dry_run,
        } => {
            let overrides = BacktestOverrides {
                symbol,
                start,
                end,
                cash,
                frequency,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides, trades)
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

fn exit_with(err: &SigtraderError) -> ExitCode {
    error!("{err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| SigtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let symbol = config.require_string("backtest", "symbol")?.to_uppercase();
    let start = config.get_string("backtest", "start_date");
    let end = config.get_string("backtest", "end_date");
    let start_date = parse_date(start.as_deref(), "start_date")?;
    let end_date = parse_date(end.as_deref(), "end_date")?;

    let frequency = match config.get_string("backtest", "frequency") {
        Some(value) => value
            .parse::<Frequency>()
            .map_err(|reason| SigtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "frequency".into(),
                reason,
            })?,
        None => Frequency::default(),
    };

    Ok(BacktestConfig {
        symbol,
        start_date,
        end_date,
        initial_cash: optional_number(config, "backtest", "initial_cash", DEFAULT_INITIAL_CASH)?,
        frequency,
    })
}

pub fn oracle_timeout(config: &dyn ConfigPort) -> Result<Duration, SigtraderError> {
    let secs = optional_number(config, "oracle", "timeout_secs", DEFAULT_ORACLE_TIMEOUT_SECS)?;
    Ok(Duration::from_secs(secs.max(1) as u64))
}

/// Build the configured oracle, wrapped in a per-call deadline.
pub fn build_oracle(config: &dyn ConfigPort) -> Result<TimeoutOracle, SigtraderError> {
    let timeout = oracle_timeout(config)?;
    let kind = config.require_string("oracle", "kind")?.to_lowercase();

    let inner: Arc<dyn DecisionOracle + Send + Sync> = match kind.as_str() {
        "replay" => {
            let path = config.require_string("oracle", "decisions_file")?;
            let oracle = ReplayOracle::from_file(&path)?;
            info!(file = %path, decisions = oracle.len(), "loaded replay oracle");
            Arc::new(oracle)
        }
        #[cfg(feature = "http")]
        "http" => {
            use crate::adapters::http_oracle::HttpOracle;
            let url = config.require_string("oracle", "url")?;
            info!(%url, timeout = ?timeout, "using HTTP oracle");
            Arc::new(HttpOracle::new(&url, timeout)?)
        }
        #[cfg(not(feature = "http"))]
        "http" => {
            return Err(SigtraderError::ConfigInvalid {
                section: "oracle".into(),
                key: "kind".into(),
                reason: "http feature is required for the http oracle".into(),
            });
        }
        other => {
            return Err(SigtraderError::ConfigInvalid {
                section: "oracle".into(),
                key: "kind".into(),
                reason: format!("unknown oracle kind '{}'", other),
            });
        }
    };

    Ok(TimeoutOracle::new(inner, timeout))
}

/// Load prices, simulate, analyse and report.
pub fn run_backtest_pipeline(
    price_port: &dyn PriceDataPort,
    oracle: &dyn DecisionOracle,
    bt_config: &BacktestConfig,
    report: &dyn ReportPort,
) -> Result<(BacktestResult, Metrics), SigtraderError> {
    info!(
        symbol = %bt_config.symbol,
        "loading prices {} to {}", bt_config.start_date, bt_config.end_date
    );
    let series = PriceSeries::load(
        price_port,
        &bt_config.symbol,
        bt_config.start_date,
        bt_config.end_date,
    )?;
    info!(bars = series.len(), "price series loaded");

    let result = backtest_engine::run_backtest(bt_config, &series, oracle)?;
    if result.oracle_failures > 0 {
        warn!(
            failures = result.oracle_failures,
            dates = result.snapshots.len(),
            "some oracle calls failed and were treated as hold"
        );
    }

    let metrics = Metrics::analyze(&result.snapshots, &result.trades, result.initial_cash)?;
    report.write(&result, &metrics)?;
    Ok((result, metrics))
}

fn run_backtest(config_path: &Path, overrides: &BacktestOverrides, show_trades: bool) -> ExitCode {
    info!("loading config from {}", config_path.display());
    let file_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return exit_with(&e),
    };
    let config = OverlayConfig::with_overrides(&file_config, overrides);

    if let Err(e) = validate_all(&config) {
        return exit_with(&e);
    }

    let outcome = build_backtest_config(&config).and_then(|bt_config| {
        let oracle = build_oracle(&config)?;
        let price_port = CsvAdapter::new(PathBuf::from(config.require_string("data", "csv_dir")?));
        let report = ConsoleReportAdapter::new(show_trades);
        run_backtest_pipeline(&price_port, &oracle, &bt_config, &report)
    });

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => exit_with(&e),
    }
}

pub fn run_dry_run(config_path: &Path, overrides: &BacktestOverrides) -> ExitCode {
    let file_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return exit_with(&e),
    };
    let config = OverlayConfig::with_overrides(&file_config, overrides);

    let plan = validate_backtest_config(&config)
        .and_then(|_| validate_data_config(&config))
        .and_then(|_| validate_oracle_config(&config))
        .and_then(|_| build_backtest_config(&config))
        .and_then(|bt_config| {
            let port = CsvAdapter::new(PathBuf::from(config.require_string("data", "csv_dir")?));
            let series = PriceSeries::load(
                &port,
                &bt_config.symbol,
                bt_config.start_date,
                bt_config.end_date,
            )?;
            Ok((bt_config, series))
        });

    let (bt_config, series) = match plan {
        Ok(p) => p,
        Err(e) => return exit_with(&e),
    };

    let dates = rebalance_dates(bt_config.start_date, bt_config.end_date, bt_config.frequency);
    println!("Symbol:           {}", bt_config.symbol);
    println!("Period:           {} to {}", bt_config.start_date, bt_config.end_date);
    println!("Initial cash:     {:.2}", bt_config.initial_cash);
    println!("Frequency:        {}", bt_config.frequency);
    println!("Price bars:       {}", series.len());
    println!("Rebalance dates:  {}", dates.len());
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("  first: {}  last: {}", first, last);
    }
    println!(
        "Oracle:           {}",
        config.get_string("oracle", "kind").unwrap_or_default()
    );
    if dates.len() < 2 {
        warn!("fewer than 2 rebalancing dates; performance metrics will be unavailable");
    }
    println!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    info!("validating {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return exit_with(&e),
    };

    match validate_all(&config) {
        Ok(()) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => exit_with(&e),
    }
}
