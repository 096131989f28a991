//! Rolling per-symbol ticker table fed by the multiplexed mini-ticker stream.
//!
//! Frames may be partial: symbols absent from an incoming frame keep their
//! last-seen snapshot until the board is explicitly reset.

use crate::engine::config;
use crate::engine::types::{MiniTicker, Ticker};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Sort orders for presenting the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Volume,
    Gainers,
    Losers,
}

/// Symbol-keyed table of the latest ticker snapshots.
///
/// Insertion order is preserved across overwrites, so volume ranking with a
/// stable sort breaks ties by the order symbols were first seen.
#[derive(Debug, Default)]
pub struct TickerBoard {
    tickers: IndexMap<String, Ticker>,
}

impl TickerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one raw ticker frame into the board.
    ///
    /// Records outside the configured quote asset are skipped, as are records
    /// whose numeric fields fail to parse. Symbols not present in the frame
    /// are retained untouched.
    pub fn ingest(&mut self, frame: &[MiniTicker]) {
        for record in frame {
            if !record.symbol.ends_with(config::quote_suffix()) {
                continue;
            }
            let (Ok(open), Ok(close), Ok(volume)) = (
                record.open.parse::<f64>(),
                record.close.parse::<f64>(),
                record.quote_volume.parse::<f64>(),
            ) else {
                continue;
            };
            let change_percent = if open == 0.0 {
                0.0
            } else {
                (close - open) / open * 100.0
            };
            self.tickers.insert(
                record.symbol.clone(),
                Ticker {
                    symbol: record.symbol.clone(),
                    price: close,
                    change_percent,
                    volume,
                },
            );
        }
    }

    /// The `n` symbols with greatest volume, descending.
    pub fn top_by_volume(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<&Ticker> = self.tickers.values().collect();
        ranked.sort_by(|a, b| b.volume.partial_cmp(&a.volume).unwrap_or(Ordering::Equal));
        ranked.into_iter().take(n).map(|t| t.symbol.clone()).collect()
    }

    /// Board contents ordered by the given key, for presentation.
    pub fn sorted(&self, key: SortKey) -> Vec<Ticker> {
        let mut all: Vec<Ticker> = self.tickers.values().cloned().collect();
        match key {
            SortKey::Volume => {
                all.sort_by(|a, b| b.volume.partial_cmp(&a.volume).unwrap_or(Ordering::Equal))
            }
            SortKey::Gainers => all.sort_by(|a, b| {
                b.change_percent
                    .partial_cmp(&a.change_percent)
                    .unwrap_or(Ordering::Equal)
            }),
            SortKey::Losers => all.sort_by(|a, b| {
                a.change_percent
                    .partial_cmp(&b.change_percent)
                    .unwrap_or(Ordering::Equal)
            }),
        }
        all
    }

    /// Case-insensitive symbol substring filter.
    pub fn search(&self, needle: &str) -> Vec<Ticker> {
        let needle = needle.to_uppercase();
        self.tickers
            .values()
            .filter(|t| t.symbol.contains(&needle))
            .cloned()
            .collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&Ticker> {
        self.tickers.get(symbol)
    }

    /// Owned copy of the board for cross-component reads.
    pub fn snapshot(&self) -> Vec<Ticker> {
        self.tickers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Drop everything; used when the feed subscription is replaced.
    pub fn reset(&mut self) {
        self.tickers.clear();
    }
}
