//! Candle history polling over the exchange REST API.
//!
//! The raw kline row is an ordered tuple with string-encoded numerics; rows
//! that fail to parse are skipped. `poll_klines` is the fail-soft surface the
//! rest of the engine consumes: transport failures degrade to an empty window
//! so "no data yet" and "fetch failed" look identical to callers.

use crate::engine::config;
use crate::engine::error::FetchError;
use crate::engine::types::{Kline, KlineInterval, MarketType};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Raw kline row as returned by the `/klines` endpoint.
#[derive(Debug, serde::Deserialize)]
struct RawKline(
    i64,    // 0: open time
    String, // 1: open
    String, // 2: high
    String, // 3: low
    String, // 4: close
    String, // 5: volume
    i64,    // 6: close time
    String, // 7: quote asset volume
    i64,    // 8: number of trades
    String, // 9: taker buy base volume
    String, // 10: taker buy quote volume
    String, // 11: ignore
);

impl RawKline {
    fn into_kline(self) -> Option<Kline> {
        Some(Kline {
            open_time: self.0,
            open: self.1.parse().ok()?,
            high: self.2.parse().ok()?,
            low: self.3.parse().ok()?,
            close: self.4.parse().ok()?,
            volume: self.5.parse().ok()?,
        })
    }
}

/// Fetch the last `limit` candles for a symbol, oldest first.
pub async fn fetch_klines(
    client: &reqwest::Client,
    symbol: &str,
    interval: KlineInterval,
    market: MarketType,
    limit: usize,
) -> Result<Vec<Kline>, FetchError> {
    let url = format!(
        "{}/klines?symbol={}&interval={}&limit={}",
        market.rest_base(),
        symbol.to_uppercase(),
        interval.as_str(),
        limit
    );

    let response = client
        .get(&url)
        .timeout(Duration::from_secs(10))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let rows: Vec<RawKline> = response.json().await?;
    Ok(rows.into_iter().filter_map(RawKline::into_kline).collect())
}

/// Fail-soft poll: transport errors are logged and surfaced as an empty
/// window, never as an error.
pub async fn poll_klines(
    client: &reqwest::Client,
    symbol: &str,
    interval: KlineInterval,
    market: MarketType,
    limit: usize,
) -> Vec<Kline> {
    match fetch_klines(client, symbol, interval, market, limit).await {
        Ok(candles) => candles,
        Err(e) => {
            debug!("kline poll for {} failed: {}", symbol, e);
            Vec::new()
        }
    }
}

/// Candles requested for the active chart window.
pub const CHART_LIMIT: usize = 100;

/// Spawn the fixed-period chart poller for one symbol.
///
/// Each poll replaces the shared window wholesale, including with an empty
/// window on failure.
pub fn spawn_chart_poll(
    symbol: String,
    interval: KlineInterval,
    market: MarketType,
    window: Arc<Mutex<Vec<Kline>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut tick = tokio::time::interval(config::chart_poll_interval());
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let candles = poll_klines(&client, &symbol, interval, market, CHART_LIMIT).await;
            if candles.is_empty() {
                warn!("no candles for {} this cycle", symbol);
            }
            *window.lock().await = candles;
        }
    })
}
