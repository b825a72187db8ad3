//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod ohlcv;
pub mod price_series;
pub mod schedule;
pub mod signal;
