//! Rebalancing calendar.

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// How often the simulation asks the oracle for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    Daily,
    /// Week-ending Sundays.
    #[default]
    Weekly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Weekly => f.write_str("weekly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            other => Err(format!("unknown frequency '{other}' (expected daily or weekly)")),
        }
    }
}

/// Ordered rebalancing dates within `[start, end]`.
pub fn rebalance_dates(start: NaiveDate, end: NaiveDate, frequency: Frequency) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let (first, step) = match frequency {
        Frequency::Daily => (start, 1),
        Frequency::Weekly => {
            let ahead = (7 - start.weekday().num_days_from_sunday()) % 7;
            match start.checked_add_days(Days::new(u64::from(ahead))) {
                Some(sunday) => (sunday, 7),
                None => return Vec::new(),
            }
        }
    };

    let mut dates = Vec::new();
    let mut current = Some(first);
    while let Some(d) = current {
        if d > end {
            break;
        }
        dates.push(d);
        current = d.checked_add_days(Days::new(step));
    }
    dates
}
