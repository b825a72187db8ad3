//! Oracle that replays recorded decisions from a CSV file.
//!
//! Expected header: `date,decision`. Decisions containing commas must be
//! quoted. Dates without a recorded decision are reported as oracle errors.

use crate::domain::error::SigtraderError;
use crate::domain::signal::DecisionPayload;
use crate::ports::oracle_port::DecisionOracle;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ReplayOracle {
    decisions: BTreeMap<NaiveDate, String>,
}

impl ReplayOracle {
    pub fn new<I>(decisions: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, String)>,
    {
        Self {
            decisions: decisions.into_iter().collect(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SigtraderError> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_path(path).map_err(|e| SigtraderError::ConfigInvalid {
            section: "oracle".into(),
            key: "decisions_file".into(),
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut decisions = BTreeMap::new();
        for (line, result) in rdr.records().enumerate() {
            let bad_row = |reason: String| SigtraderError::ConfigInvalid {
                section: "oracle".into(),
                key: "decisions_file".into(),
                reason: format!("row {}: {}", line + 1, reason),
            };

            let record = result.map_err(|e| bad_row(e.to_string()))?;
            let date_str = record.get(0).ok_or_else(|| bad_row("missing date".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| bad_row(format!("invalid date '{}': {}", date_str, e)))?;
            let decision = record.get(1).unwrap_or_default().trim().to_string();
            decisions.insert(date, decision);
        }

        Ok(Self { decisions })
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl DecisionOracle for ReplayOracle {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        self.decisions
            .get(&date)
            .map(|d| DecisionPayload::Text(d.clone()))
            .ok_or_else(|| {
                SigtraderError::oracle(format!("no decision recorded for {} on {}", symbol, date))
            })
    }
}
