//! Headless market monitor.
//!
//! Wires the live feeds, the chart poller, and the anomaly scanner together
//! and logs accepted alerts until interrupted. With SENTINEL_FOLLOW_ALERTS=1
//! the session pivots its depth/trade subscription to the most recently
//! alerted symbol.

use std::sync::Arc;
use std::time::Duration;

use market_sentinel::{
    spawn_scanner, AlertStore, BellSink, KlineInterval, MarketSession, MarketType, SortKey,
};
use rustls::crypto::ring::default_provider;
use tokio::sync::Mutex;
use tracing::info;

/// Active symbol at startup (env: SENTINEL_SYMBOL, default BTCUSDT)
fn get_symbol() -> String {
    std::env::var("SENTINEL_SYMBOL")
        .unwrap_or_else(|_| "BTCUSDT".to_string())
        .to_uppercase()
}

/// Market segment (env: SENTINEL_MARKET, SPOT or FUTURES, default SPOT)
fn get_market() -> MarketType {
    std::env::var("SENTINEL_MARKET")
        .ok()
        .and_then(|v| MarketType::parse(&v))
        .unwrap_or(MarketType::Spot)
}

/// Chart candle interval (env: SENTINEL_INTERVAL, default 15m)
fn get_interval() -> KlineInterval {
    std::env::var("SENTINEL_INTERVAL")
        .ok()
        .and_then(|v| KlineInterval::parse(&v))
        .unwrap_or(KlineInterval::M15)
}

fn follow_alerts() -> bool {
    std::env::var("SENTINEL_FOLLOW_ALERTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let _ = default_provider().install_default();
    init_logging();

    let market = get_market();
    let symbol = get_symbol();
    let interval = get_interval();
    info!(
        "starting market sentinel: {} {} ({})",
        market.label(),
        symbol,
        interval.as_str()
    );

    let mut session = MarketSession::start(symbol, interval, market);
    let store = Arc::new(Mutex::new(AlertStore::new(Box::new(BellSink))));
    let scanner = spawn_scanner(session.board(), Arc::clone(&store), market);

    let mut status_tick = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            _ = status_tick.tick() => {
                log_status(&session, &store).await;
                if follow_alerts() {
                    let latest = store.lock().await.latest().map(|a| a.symbol.clone());
                    if let Some(symbol) = latest {
                        session.select_symbol(symbol).await;
                    }
                }
            }
        }
    }

    scanner.abort();
    session.shutdown();
}

async fn log_status(session: &MarketSession, store: &Mutex<AlertStore>) {
    let board = session.board();
    let (known, leader) = {
        let board = board.lock().await;
        (board.len(), board.sorted(SortKey::Volume).into_iter().next())
    };
    if let Some(leader) = leader {
        info!(
            "volume leader {} at {} ({:+.2}%)",
            leader.symbol, leader.price, leader.change_percent
        );
    }

    let market_handle = session.symbol_market();
    let spread = {
        let market = market_handle.lock().await;
        market.spread()
    };

    let store = store.lock().await;
    match store.latest() {
        Some(alert) => info!(
            "tickers={} ticker_feed={:?} {} spread={:?} alerts={} latest: {} {}",
            known,
            session.ticker_status(),
            session.symbol(),
            spread,
            store.len(),
            alert.symbol,
            alert.message
        ),
        None => info!(
            "tickers={} ticker_feed={:?} {} spread={:?} no alerts yet",
            known,
            session.ticker_status(),
            session.symbol(),
            spread
        ),
    }
}
