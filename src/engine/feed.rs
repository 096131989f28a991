//! Live WebSocket feeds: the multiplexed ticker stream and the per-symbol
//! combined depth/trade stream.
//!
//! Each feed is one spawned task owning its connection and the mutations of
//! its target state. Frames that fail to parse are dropped at debug level;
//! connection errors trigger a delayed reconnect. Teardown is external: the
//! owner aborts the task handle before spawning a replacement, which is what
//! guarantees at most one connection per logical subscription.

use crate::engine::config;
use crate::engine::market::SymbolMarket;
use crate::engine::tickers::TickerBoard;
use crate::engine::types::{AggTrade, DepthSnapshot, MarketType, MiniTicker, StreamEnvelope, Trade};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Connection status for a feed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// URL of the multiplexed all-symbols mini-ticker stream.
pub fn ticker_stream_url(market: MarketType) -> String {
    format!("{}/ws/!miniTicker@arr", market.ws_base())
}

/// URL of the combined depth + trade stream for one symbol.
pub fn symbol_stream_url(symbol: &str, market: MarketType) -> String {
    let symbol = symbol.to_lowercase();
    format!(
        "{}/stream?streams={}@depth20@100ms/{}@aggTrade",
        market.ws_base(),
        symbol,
        symbol
    )
}

/// Spawn the ticker feed task.
///
/// On every (re)connection the board is reset so a fresh connection
/// repopulates it wholesale rather than layering onto stale entries.
pub fn spawn_ticker_feed(
    market: MarketType,
    board: Arc<Mutex<TickerBoard>>,
    status_tx: watch::Sender<FeedStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = ticker_stream_url(market);
        info!("starting ticker feed for {}", url);

        loop {
            let _ = status_tx.send(FeedStatus::Reconnecting);

            match connect_async(&url).await {
                Ok((ws_stream, _)) => {
                    info!("ticker feed connected to {}", url);
                    let _ = status_tx.send(FeedStatus::Connected);
                    board.lock().await.reset();

                    let (_, mut read) = ws_stream.split();

                    while let Some(msg) = read.next().await {
                        match msg {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<Vec<MiniTicker>>(&text) {
                                    Ok(frame) => {
                                        board.lock().await.ingest(&frame);
                                    }
                                    Err(e) => {
                                        debug!("dropping non-array ticker frame: {}", e);
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => {
                                warn!("ticker feed closed by server");
                                break;
                            }
                            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                                // Heartbeat, handled by the transport.
                            }
                            Err(e) => {
                                error!("ticker feed error: {}", e);
                                break;
                            }
                            _ => {}
                        }
                    }

                    let _ = status_tx.send(FeedStatus::Disconnected);
                }
                Err(e) => {
                    error!("failed to connect ticker feed to {}: {}", url, e);
                    let _ = status_tx.send(FeedStatus::Disconnected);
                }
            }

            tokio::time::sleep(config::reconnect_delay()).await;
        }
    })
}

/// Spawn the combined depth/trade feed for one symbol.
///
/// The two sub-streams are routed by the envelope's stream name. State is
/// reset on every (re)connection so nothing from a prior connection can
/// linger past the new connection's first message.
pub fn spawn_symbol_feed(
    symbol: String,
    market: MarketType,
    state: Arc<Mutex<SymbolMarket>>,
    status_tx: watch::Sender<FeedStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = symbol_stream_url(&symbol, market);
        info!("starting {} market feed for {}", symbol, url);

        loop {
            let _ = status_tx.send(FeedStatus::Reconnecting);

            match connect_async(&url).await {
                Ok((ws_stream, _)) => {
                    info!("{} market feed connected", symbol);
                    let _ = status_tx.send(FeedStatus::Connected);
                    state.lock().await.reset();

                    let (_, mut read) = ws_stream.split();

                    while let Some(msg) = read.next().await {
                        match msg {
                            Ok(Message::Text(text)) => {
                                let envelope = match serde_json::from_str::<StreamEnvelope>(&text) {
                                    Ok(envelope) => envelope,
                                    Err(e) => {
                                        debug!("dropping frame without stream tag: {}", e);
                                        continue;
                                    }
                                };
                                route_envelope(&state, envelope).await;
                            }
                            Ok(Message::Close(_)) => {
                                warn!("{} market feed closed by server", symbol);
                                break;
                            }
                            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                            Err(e) => {
                                error!("{} market feed error: {}", symbol, e);
                                break;
                            }
                            _ => {}
                        }
                    }

                    let _ = status_tx.send(FeedStatus::Disconnected);
                }
                Err(e) => {
                    error!("failed to connect {} market feed: {}", symbol, e);
                    let _ = status_tx.send(FeedStatus::Disconnected);
                }
            }

            tokio::time::sleep(config::reconnect_delay()).await;
        }
    })
}

async fn route_envelope(state: &Mutex<SymbolMarket>, envelope: StreamEnvelope) {
    if envelope.stream.contains("depth20") {
        match serde_json::from_value::<DepthSnapshot>(envelope.data) {
            Ok(snapshot) => state.lock().await.apply_depth(&snapshot),
            Err(e) => debug!("dropping malformed depth snapshot: {}", e),
        }
    } else if envelope.stream.contains("aggTrade") {
        match serde_json::from_value::<AggTrade>(envelope.data) {
            Ok(raw) => {
                if let Some(trade) = Trade::from_agg(&raw) {
                    state.lock().await.push_trade(trade);
                } else {
                    debug!("dropping trade print with unparseable numerics");
                }
            }
            Err(e) => debug!("dropping malformed trade print: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_stream_url() {
        assert_eq!(
            ticker_stream_url(MarketType::Spot),
            "wss://stream.binance.com:9443/ws/!miniTicker@arr"
        );
        assert_eq!(
            ticker_stream_url(MarketType::Futures),
            "wss://fstream.binance.com/ws/!miniTicker@arr"
        );
    }

    #[test]
    fn test_symbol_stream_url_lowercases() {
        assert_eq!(
            symbol_stream_url("BTCUSDT", MarketType::Spot),
            "wss://stream.binance.com:9443/stream?streams=btcusdt@depth20@100ms/btcusdt@aggTrade"
        );
    }

    #[tokio::test]
    async fn test_route_envelope_depth_and_trade() {
        let state = Mutex::new(SymbolMarket::new());

        let depth: StreamEnvelope = serde_json::from_str(
            r#"{"stream":"btcusdt@depth20@100ms","data":{"bids":[["100.0","1.0"]],"asks":[["100.5","2.0"]]}}"#,
        )
        .unwrap();
        route_envelope(&state, depth).await;
        assert_eq!(state.lock().await.bids().len(), 1);

        let trade: StreamEnvelope = serde_json::from_str(
            r#"{"stream":"btcusdt@aggTrade","data":{"a":7,"p":"100.2","q":"0.3","T":1700000000000,"m":false}}"#,
        )
        .unwrap();
        route_envelope(&state, trade).await;
        assert_eq!(state.lock().await.trade_count(), 1);
    }

    #[tokio::test]
    async fn test_route_envelope_unknown_stream_ignored() {
        let state = Mutex::new(SymbolMarket::new());
        let other: StreamEnvelope = serde_json::from_str(
            r#"{"stream":"btcusdt@kline_1m","data":{"k":{}}}"#,
        )
        .unwrap();
        route_envelope(&state, other).await;
        assert!(state.lock().await.is_empty());
    }
}
