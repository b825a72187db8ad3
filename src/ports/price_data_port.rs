//! Historical price data port trait.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// A source of daily bars for one symbol.
///
/// Implementations return every bar in the inclusive range `[start_date,
/// end_date]`. Network, caching and retry concerns belong to the adapter.
pub trait PriceDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError>;
}
