//! Periodic anomaly scan over the highest-volume symbols.
//!
//! Each cycle ranks the ticker board by volume, fetches a short 5m candle
//! window per symbol, and compares the still-forming latest candle against
//! the closed one before it. Comparing against the forming candle is what
//! lets an alert fire before the bucket closes. Polling is sequential per
//! symbol to bound outbound request concurrency against the upstream API.

use crate::engine::alerts::{AlertKind, AlertStore};
use crate::engine::config;
use crate::engine::klines::poll_klines;
use crate::engine::tickers::TickerBoard;
use crate::engine::types::{Kline, KlineInterval, MarketType};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Volume must exceed the previous candle by this factor.
pub const VOLUME_SPIKE_RATIO: f64 = 1.3;
/// Close-to-close move, in percent, beyond which a surge/dump fires.
pub const PRICE_MOVE_THRESHOLD_PCT: f64 = 10.0;
/// Candles fetched per symbol each cycle; only the last two are compared.
pub const SCAN_WINDOW: usize = 5;

/// A detected anomaly, before dedup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anomaly {
    pub kind: AlertKind,
    /// Percent volume increase, or signed percent price change.
    pub magnitude: f64,
}

/// Evaluate the anomaly rule for one symbol.
///
/// The volume check short-circuits the price check, so at most one anomaly
/// is reported per evaluation. Both thresholds are strict.
pub fn check_anomaly(latest: &Kline, previous: &Kline) -> Option<Anomaly> {
    if latest.volume > previous.volume * VOLUME_SPIKE_RATIO {
        let magnitude = (latest.volume - previous.volume) / previous.volume * 100.0;
        return Some(Anomaly {
            kind: AlertKind::VolumeSpike,
            magnitude,
        });
    }

    if previous.close == 0.0 {
        return None;
    }
    let price_change = (latest.close - previous.close) / previous.close * 100.0;
    if price_change > PRICE_MOVE_THRESHOLD_PCT {
        return Some(Anomaly {
            kind: AlertKind::PriceSurge,
            magnitude: price_change,
        });
    }
    if price_change < -PRICE_MOVE_THRESHOLD_PCT {
        return Some(Anomaly {
            kind: AlertKind::PriceDump,
            magnitude: price_change,
        });
    }

    None
}

/// Run one scan cycle: rank, poll sequentially, offer candidates.
pub async fn scan_once(
    client: &reqwest::Client,
    board: &Mutex<TickerBoard>,
    store: &Mutex<AlertStore>,
    market: MarketType,
) {
    // Copy the ranking out under the lock so the feed can keep merging.
    let symbols = { board.lock().await.top_by_volume(config::scan_top_n()) };
    if symbols.is_empty() {
        debug!("ticker board not warmed up, skipping scan cycle");
        return;
    }

    for symbol in symbols {
        let candles = poll_klines(client, &symbol, KlineInterval::M5, market, SCAN_WINDOW).await;
        if candles.len() < 2 {
            continue;
        }
        let latest = &candles[candles.len() - 1];
        let previous = &candles[candles.len() - 2];
        if let Some(anomaly) = check_anomaly(latest, previous) {
            store.lock().await.offer(&symbol, anomaly.kind, anomaly.magnitude);
        }
    }
}

/// Spawn the fixed-period scanner task.
pub fn spawn_scanner(
    board: Arc<Mutex<TickerBoard>>,
    store: Arc<Mutex<AlertStore>>,
    market: MarketType,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut tick = tokio::time::interval(config::scan_interval());
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            scan_once(&client, &board, &store, market).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(close: f64, volume: f64) -> Kline {
        Kline {
            open_time: 0,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn test_volume_spike_detected() {
        let previous = candle(100.0, 100.0);
        let latest = candle(100.0, 140.0);
        let anomaly = check_anomaly(&latest, &previous).unwrap();
        assert_eq!(anomaly.kind, AlertKind::VolumeSpike);
        assert!((anomaly.magnitude - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_volume_check_short_circuits_price_check() {
        // 40% volume increase and a 15% price move together: the volume
        // spike wins, not the surge.
        let previous = candle(100.0, 100.0);
        let latest = candle(115.0, 140.0);
        let anomaly = check_anomaly(&latest, &previous).unwrap();
        assert_eq!(anomaly.kind, AlertKind::VolumeSpike);
    }

    #[test]
    fn test_volume_threshold_is_strict() {
        // Exactly 1.3x is not a spike.
        let previous = candle(100.0, 100.0);
        let latest = candle(100.0, 130.0);
        assert!(check_anomaly(&latest, &previous).is_none());
    }

    #[test]
    fn test_price_surge_detected() {
        let previous = candle(100.0, 100.0);
        let latest = candle(112.5, 100.0);
        let anomaly = check_anomaly(&latest, &previous).unwrap();
        assert_eq!(anomaly.kind, AlertKind::PriceSurge);
        assert!((anomaly.magnitude - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_price_dump_detected() {
        let previous = candle(100.0, 100.0);
        let latest = candle(85.0, 100.0);
        let anomaly = check_anomaly(&latest, &previous).unwrap();
        assert_eq!(anomaly.kind, AlertKind::PriceDump);
        assert!((anomaly.magnitude + 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_threshold_is_strict() {
        // Exactly +10% is not a surge, exactly -10% is not a dump.
        let previous = candle(100.0, 100.0);
        assert!(check_anomaly(&candle(110.0, 100.0), &previous).is_none());
        assert!(check_anomaly(&candle(90.0, 100.0), &previous).is_none());
    }

    #[test]
    fn test_quiet_market_no_anomaly() {
        let previous = candle(100.0, 100.0);
        let latest = candle(100.5, 105.0);
        assert!(check_anomaly(&latest, &previous).is_none());
    }

    #[test]
    fn test_zero_previous_close_no_price_anomaly() {
        let previous = candle(0.0, 100.0);
        let latest = candle(50.0, 100.0);
        assert!(check_anomaly(&latest, &previous).is_none());
    }
}
