#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::backtest::{BacktestResult, BacktestConfig};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::metrics::Metrics;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::schedule::Frequency;
use sigtrader::domain::signal::DecisionPayload;
use sigtrader::ports::oracle_port::DecisionOracle;
use sigtrader::ports::price_data_port::PriceDataPort;
use sigtrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::data_unavailable(symbol, reason.clone()));
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Oracle answering from a per-date script; unscripted dates fail.
pub struct ScriptedOracle {
    pub script: HashMap<NaiveDate, Result<String, String>>,
    pub calls: RefCell<Vec<NaiveDate>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn answer(mut self, date: NaiveDate, decision: &str) -> Self {
        self.script.insert(date, Ok(decision.to_string()));
        self
    }

    pub fn fail(mut self, date: NaiveDate, reason: &str) -> Self {
        self.script.insert(date, Err(reason.to_string()));
        self
    }
}

impl DecisionOracle for ScriptedOracle {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        self.calls.borrow_mut().push(date);
        match self.script.get(&date) {
            Some(Ok(text)) => Ok(DecisionPayload::Text(text.clone())),
            Some(Err(reason)) => Err(SigtraderError::oracle(reason.clone())),
            None => Err(SigtraderError::oracle(format!("nothing scripted for {symbol} on {date}"))),
        }
    }
}

/// Report port that remembers what it was asked to write.
#[derive(Default)]
pub struct CapturingReport {
    pub written: RefCell<Vec<(BacktestResult, Metrics)>>,
}

impl ReportPort for CapturingReport {
    fn write(&self, result: &BacktestResult, metrics: &Metrics) -> Result<(), SigtraderError> {
        self.written
            .borrow_mut()
            .push((result.clone(), metrics.clone()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// Weekday bars only, starting at `start_date`, closes rising by `step`.
pub fn generate_weekday_bars(
    symbol: &str,
    start_date: NaiveDate,
    days: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    use chrono::{Datelike, Weekday};
    (0..days)
        .map(|i| start_date + chrono::Duration::days(i as i64))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .enumerate()
        .map(|(i, d)| {
            let close = start_price + step * i as f64;
            OhlcvBar {
                symbol: symbol.to_string(),
                date: d,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

pub fn daily_config(symbol: &str, start: NaiveDate, end: NaiveDate, cash: f64) -> BacktestConfig {
    BacktestConfig {
        symbol: symbol.to_string(),
        start_date: start,
        end_date: end,
        initial_cash: cash,
        frequency: Frequency::Daily,
    }
}
