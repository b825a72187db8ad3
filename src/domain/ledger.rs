//! Cash/share ledger and all-in/all-out trade execution.
//!
//! Buys spend as much cash as whole shares allow; sells liquidate the whole
//! position. Either is silently skipped when there is nothing to trade with.

use chrono::NaiveDate;
use std::fmt;

use super::signal::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.pad("buy"),
            TradeSide::Sell => f.pad("sell"),
        }
    }
}

/// An executed fill. `cash_flow` is the cost of a buy or the proceeds of a sell.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: TradeSide,
    pub shares: u64,
    pub price: f64,
    pub cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    shares: u64,
    trades: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Ledger {
            cash: initial_cash.max(0.0),
            shares: 0,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self) -> u64 {
        self.shares
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    pub fn value_at(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }

    /// Spend cash on as many whole shares as it covers at `price`.
    pub fn buy(&mut self, price: f64, date: NaiveDate) -> Option<Trade> {
        if self.cash <= 0.0 || !price.is_finite() || price <= 0.0 {
            return None;
        }

        let shares = (self.cash / price).floor() as u64;
        if shares == 0 {
            return None;
        }

        let cost = shares as f64 * price;
        // floor() keeps cost <= cash; clamp away float residue below zero
        self.cash = (self.cash - cost).max(0.0);
        self.shares += shares;

        Some(self.record(Trade {
            date,
            side: TradeSide::Buy,
            shares,
            price,
            cash_flow: cost,
        }))
    }

    /// Liquidate the entire position at `price`.
    pub fn sell(&mut self, price: f64, date: NaiveDate) -> Option<Trade> {
        if self.shares == 0 {
            return None;
        }

        let shares = self.shares;
        let proceeds = shares as f64 * price;
        self.cash += proceeds;
        self.shares = 0;

        Some(self.record(Trade {
            date,
            side: TradeSide::Sell,
            shares,
            price,
            cash_flow: proceeds,
        }))
    }

    pub fn execute(&mut self, action: Action, price: f64, date: NaiveDate) -> Option<Trade> {
        match action {
            Action::Buy => self.buy(price, date),
            Action::Sell => self.sell(price, date),
            Action::Hold => None,
        }
    }

    fn record(&mut self, trade: Trade) -> Trade {
        self.trades.push(trade.clone());
        trade
    }
}
