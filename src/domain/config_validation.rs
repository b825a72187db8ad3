//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::backtest::DEFAULT_INITIAL_CASH;
use crate::domain::error::SigtraderError;
use crate::domain::schedule::Frequency;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub const ORACLE_KINDS: [&str; 2] = ["replay", "http"];

pub const DEFAULT_ORACLE_TIMEOUT_SECS: i64 = 120;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_symbol(config)?;
    validate_initial_cash(config)?;
    validate_dates(config)?;
    validate_frequency(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    config.require_string("data", "csv_dir")?;
    Ok(())
}

pub fn validate_oracle_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let kind = config.require_string("oracle", "kind")?.to_lowercase();
    match kind.as_str() {
        "replay" => {
            config.require_string("oracle", "decisions_file")?;
        }
        "http" => {
            config.require_string("oracle", "url")?;
        }
        _ => {
            return Err(invalid(
                "oracle",
                "kind",
                format!(
                    "unknown oracle kind '{}' (expected one of {})",
                    kind,
                    ORACLE_KINDS.join(", ")
                ),
            ));
        }
    }

    let timeout = optional_number(config, "oracle", "timeout_secs", DEFAULT_ORACLE_TIMEOUT_SECS)?;
    if timeout <= 0 {
        return Err(invalid(
            "oracle",
            "timeout_secs",
            "timeout_secs must be positive".into(),
        ));
    }
    Ok(())
}

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_backtest_config(config)?;
    validate_data_config(config)?;
    validate_oracle_config(config)?;
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

/// Read a numeric key, falling back to `default` only when the key is absent.
///
/// A value that is present but does not parse is an error, never the default.
pub fn optional_number<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SigtraderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            invalid(section, key, format!("'{}' is not a number: {}", raw.trim(), e))
        }),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let symbol = config.require_string("backtest", "symbol")?;
    if symbol.contains(char::is_whitespace) || symbol.contains(',') {
        return Err(invalid(
            "backtest",
            "symbol",
            "symbol must be a single ticker".to_string(),
        ));
    }
    Ok(())
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value: f64 = optional_number(config, "backtest", "initial_cash", DEFAULT_INITIAL_CASH)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok(())
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(value) = config.get_string("backtest", "frequency") {
        value
            .parse::<Frequency>()
            .map_err(|reason| invalid("backtest", "frequency", reason))?;
    }
    Ok(())
}
