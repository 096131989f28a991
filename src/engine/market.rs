//! Bounded order book and recent-trade buffer for the active symbol.
//!
//! Both collections are owned by the symbol feed task; everything else reads
//! cloned snapshots. Depth updates replace the book wholesale, trade prints
//! are prepended into a fixed-capacity ring.

use crate::engine::types::{parse_level, BookLevel, DepthSnapshot, Trade};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Book levels retained per side.
pub const BOOK_DEPTH: usize = 20;
/// Trade prints retained, newest first.
pub const TRADE_CAPACITY: usize = 50;

/// Market state for the currently selected symbol.
#[derive(Debug, Default)]
pub struct SymbolMarket {
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
    trades: VecDeque<Trade>,
}

impl SymbolMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible book with a fresh depth snapshot.
    ///
    /// Bids are kept descending and asks ascending by price; unparseable
    /// levels are dropped.
    pub fn apply_depth(&mut self, snapshot: &DepthSnapshot) {
        let mut bids: Vec<BookLevel> = snapshot.bids.iter().filter_map(parse_level).collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        bids.truncate(BOOK_DEPTH);

        let mut asks: Vec<BookLevel> = snapshot.asks.iter().filter_map(parse_level).collect();
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        asks.truncate(BOOK_DEPTH);

        self.bids = bids;
        self.asks = asks;
    }

    /// Prepend a trade print, evicting the oldest beyond capacity.
    pub fn push_trade(&mut self, trade: Trade) {
        self.trades.push_front(trade);
        while self.trades.len() > TRADE_CAPACITY {
            self.trades.pop_back();
        }
    }

    pub fn bids(&self) -> &[BookLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[BookLevel] {
        &self.asks
    }

    /// Trades newest first.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    /// Bid-ask spread, when both sides are present.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Mid price, when both sides are present.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Clear both collections; called before a replacement feed attaches.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.trades.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty() && self.trades.is_empty()
    }
}
