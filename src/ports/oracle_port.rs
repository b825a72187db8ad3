//! Decision oracle port trait.

use crate::domain::error::SigtraderError;
use crate::domain::signal::DecisionPayload;
use chrono::NaiveDate;

/// An external collaborator that recommends what to do with `symbol` on `date`.
///
/// The payload is opaque to the caller until it passes through
/// [`interpret`](crate::domain::signal::interpret). Any error is treated by
/// the simulation as a hold for that date.
pub trait DecisionOracle {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError>;
}

impl<T: DecisionOracle + ?Sized> DecisionOracle for Box<T> {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        (**self).decide(symbol, date)
    }
}

impl<T: DecisionOracle + ?Sized> DecisionOracle for std::sync::Arc<T> {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        (**self).decide(symbol, date)
    }
}
