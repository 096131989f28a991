//! Market Sentinel - live market ingestion and anomaly alerting
//!
//! The engine multiplexes exchange feeds into rolling per-symbol state,
//! periodically re-evaluates the highest-volume symbols for abnormal
//! volume/price behavior, and emits deduplicated alert events with a
//! notification side effect:
//! - ticker feed -> `TickerBoard` (symbol -> latest snapshot)
//! - symbol feed -> `SymbolMarket` (bounded book + trade ring)
//! - kline poller -> candle windows for charting and scanning
//! - scanner -> `AlertStore` -> `NotificationSink`
pub mod engine;

// Re-export the engine surface for the binaries and downstream consumers
pub use engine::alerts::{AlertEvent, AlertKind, AlertStore, BellSink, NotificationSink};
pub use engine::error::FetchError;
pub use engine::feed::{
    spawn_symbol_feed, spawn_ticker_feed, symbol_stream_url, ticker_stream_url, FeedStatus,
};
pub use engine::klines::{fetch_klines, poll_klines, spawn_chart_poll, CHART_LIMIT};
pub use engine::market::{SymbolMarket, BOOK_DEPTH, TRADE_CAPACITY};
pub use engine::scanner::{
    check_anomaly, scan_once, spawn_scanner, Anomaly, PRICE_MOVE_THRESHOLD_PCT, SCAN_WINDOW,
    VOLUME_SPIKE_RATIO,
};
pub use engine::session::MarketSession;
pub use engine::tickers::{SortKey, TickerBoard};
pub use engine::types::{
    AggTrade, BookLevel, DepthSnapshot, Kline, KlineInterval, MarketType, MiniTicker,
    StreamEnvelope, Ticker, Trade,
};
