//! Closing-price table for one symbol with nearest-date lookup.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::SigtraderError;
use crate::ports::price_data_port::PriceDataPort;

/// Immutable, date-ordered closing prices for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    closes: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    /// Fetch bars for `[start_date, end_date]` and keep their closes.
    pub fn load(
        port: &dyn PriceDataPort,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, SigtraderError> {
        let bars = port
            .fetch_bars(symbol, start_date, end_date)
            .map_err(|e| match e {
                SigtraderError::DataUnavailable { .. } => e,
                other => SigtraderError::data_unavailable(symbol, other.to_string()),
            })?;

        if let Some(bad) = bars.iter().find(|b| !b.has_valid_close()) {
            return Err(SigtraderError::data_unavailable(
                symbol,
                format!("invalid close {} on {}", bad.close, bad.date),
            ));
        }

        Self::from_closes(symbol, bars.into_iter().map(|b| (b.date, b.close)))
    }

    /// Build a series from `(date, close)` pairs in any order.
    ///
    /// Rejects an empty table, duplicated dates and closes that are not
    /// finite and positive.
    pub fn from_closes<I>(symbol: &str, closes: I) -> Result<Self, SigtraderError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut map = BTreeMap::new();
        for (date, close) in closes {
            if !(close.is_finite() && close > 0.0) {
                return Err(SigtraderError::data_unavailable(
                    symbol,
                    format!("invalid close {} on {}", close, date),
                ));
            }
            if map.insert(date, close).is_some() {
                return Err(SigtraderError::data_unavailable(
                    symbol,
                    format!("duplicate date {}", date),
                ));
            }
        }

        if map.is_empty() {
            return Err(SigtraderError::data_unavailable(
                symbol,
                "no prices in requested range",
            ));
        }

        Ok(PriceSeries {
            symbol: symbol.to_string(),
            closes: map,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next_back().copied()
    }

    /// The stored date closest to `date`; the earlier one on a tie.
    pub fn nearest_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let before = self.closes.range(..=date).next_back().map(|(d, _)| *d);
        let after = self.closes.range(date..).next().map(|(d, _)| *d);

        match (before, after) {
            (Some(b), Some(a)) => {
                if (date - b).num_days() <= (a - date).num_days() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Close on `date`, falling back to the nearest stored date.
    pub fn closing_price(&self, date: NaiveDate) -> Result<f64, SigtraderError> {
        if let Some(&close) = self.closes.get(&date) {
            return Ok(close);
        }
        self.nearest_date(date)
            .and_then(|d| self.closes.get(&d).copied())
            .ok_or_else(|| SigtraderError::data_unavailable(&self.symbol, "price series is empty"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.closes.iter().map(|(d, c)| (*d, *c))
    }
}
