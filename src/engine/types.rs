//! Core data types for the market engine.
//!
//! Wire payload structs mirror the Binance JSON field names; numeric fields
//! arrive string-encoded and are parsed at the ingestion boundary. Records
//! that fail to parse are dropped there rather than surfaced as errors.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Market segment the engine is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketType {
    Spot,
    Futures,
}

impl MarketType {
    /// REST base for kline requests.
    pub fn rest_base(&self) -> &'static str {
        match self {
            MarketType::Spot => "https://api.binance.com/api/v3",
            MarketType::Futures => "https://fapi.binance.com/fapi/v1",
        }
    }

    /// WebSocket base for live streams.
    pub fn ws_base(&self) -> &'static str {
        match self {
            MarketType::Spot => "wss://stream.binance.com:9443",
            MarketType::Futures => "wss://fstream.binance.com",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketType::Spot => "SPOT",
            MarketType::Futures => "FUTURES",
        }
    }

    /// Parse from a label such as "SPOT" or "futures".
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SPOT" => Some(MarketType::Spot),
            "FUTURES" => Some(MarketType::Futures),
            _ => None,
        }
    }
}

/// Candle bucket width for kline requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlineInterval {
    M1,
    M5,
    M15,
}

impl KlineInterval {
    /// Interval token as the exchange expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            KlineInterval::M1 => "1m",
            KlineInterval::M5 => "5m",
            KlineInterval::M15 => "15m",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(KlineInterval::M1),
            "5m" => Some(KlineInterval::M5),
            "15m" => Some(KlineInterval::M15),
            _ => None,
        }
    }
}

/// Latest price/change/volume snapshot for one trading pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub price: f64,
    /// Percent change versus the 24h open; 0 when the open is 0.
    pub change_percent: f64,
    /// 24h quote-asset volume, the ranking key for the scanner.
    pub volume: f64,
}

/// One OHLCV candle, ordered oldest to newest within a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kline {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price/quantity level in the bounded order book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookLevel {
    pub price: Decimal,
    pub qty: Decimal,
}

/// A single trade print.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub price: f64,
    pub qty: f64,
    pub time: i64,
    /// true means the buyer was the maker, i.e. the aggressor sold.
    pub is_buyer_maker: bool,
}

impl Trade {
    /// Parse a trade out of a raw aggTrade payload; None drops the print.
    pub fn from_agg(raw: &AggTrade) -> Option<Self> {
        Some(Self {
            id: raw.id,
            price: raw.price.parse().ok()?,
            qty: raw.qty.parse().ok()?,
            time: raw.time,
            is_buyer_maker: raw.is_buyer_maker,
        })
    }
}

/// One record of the multiplexed `!miniTicker@arr` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct MiniTicker {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "o", default)]
    pub open: String,
    #[serde(rename = "c", default)]
    pub close: String,
    /// Quote-asset volume ("q" on the wire).
    #[serde(rename = "q", default)]
    pub quote_volume: String,
}

/// Combined-stream envelope: `{"stream": "...", "data": {...}}`.
///
/// The payload is kept raw and deserialized once the stream name has been
/// routed to a depth or trade handler.
#[derive(Debug, Deserialize)]
pub struct StreamEnvelope {
    pub stream: String,
    pub data: serde_json::Value,
}

/// Partial depth snapshot. Spot streams use `bids`/`asks`, futures use
/// `b`/`a`; both are full replacements of the visible book.
#[derive(Debug, Default, Deserialize)]
pub struct DepthSnapshot {
    #[serde(default, alias = "b")]
    pub bids: Vec<[String; 2]>,
    #[serde(default, alias = "a")]
    pub asks: Vec<[String; 2]>,
}

/// Raw aggTrade payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AggTrade {
    #[serde(rename = "a")]
    pub id: u64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub qty: String,
    #[serde(rename = "T")]
    pub time: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Parse one `[price, qty]` string pair into a book level.
pub fn parse_level(raw: &[String; 2]) -> Option<BookLevel> {
    Some(BookLevel {
        price: Decimal::from_str(&raw[0]).ok()?,
        qty: Decimal::from_str(&raw[1]).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_type_endpoints() {
        assert!(MarketType::Spot.rest_base().contains("api.binance.com"));
        assert!(MarketType::Futures.rest_base().contains("fapi.binance.com"));
        assert!(MarketType::Spot.ws_base().starts_with("wss://stream"));
        assert!(MarketType::Futures.ws_base().starts_with("wss://fstream"));
    }

    #[test]
    fn test_market_type_parse() {
        assert_eq!(MarketType::parse("SPOT"), Some(MarketType::Spot));
        assert_eq!(MarketType::parse("futures"), Some(MarketType::Futures));
        assert_eq!(MarketType::parse("margin"), None);
    }

    #[test]
    fn test_interval_round_trip() {
        for interval in [KlineInterval::M1, KlineInterval::M5, KlineInterval::M15] {
            assert_eq!(KlineInterval::parse(interval.as_str()), Some(interval));
        }
        assert_eq!(KlineInterval::parse("4h"), None);
    }

    #[test]
    fn test_mini_ticker_deserialize() {
        let frame = r#"[{"e":"24hrMiniTicker","E":1700000000000,"s":"BTCUSDT","c":"43250.10","o":"42000.00","h":"43500.00","l":"41900.00","v":"12000.5","q":"510000000.25"}]"#;
        let records: Vec<MiniTicker> = serde_json::from_str(frame).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "BTCUSDT");
        assert_eq!(records[0].close, "43250.10");
        assert_eq!(records[0].quote_volume, "510000000.25");
    }

    #[test]
    fn test_agg_trade_to_trade() {
        let raw: AggTrade = serde_json::from_str(
            r#"{"e":"aggTrade","E":1,"s":"BTCUSDT","a":26129,"p":"43250.1","q":"0.5","f":1,"l":2,"T":1700000000123,"m":true,"M":true}"#,
        )
        .unwrap();
        let trade = Trade::from_agg(&raw).unwrap();
        assert_eq!(trade.id, 26129);
        assert_eq!(trade.price, 43250.1);
        assert!(trade.is_buyer_maker);
    }

    #[test]
    fn test_agg_trade_bad_price_dropped() {
        let raw = AggTrade {
            id: 1,
            price: "not-a-number".to_string(),
            qty: "0.5".to_string(),
            time: 1,
            is_buyer_maker: false,
        };
        assert!(Trade::from_agg(&raw).is_none());
    }

    #[test]
    fn test_depth_snapshot_accepts_both_field_names() {
        let spot: DepthSnapshot =
            serde_json::from_str(r#"{"lastUpdateId":1,"bids":[["100.0","1.5"]],"asks":[["100.5","2.0"]]}"#).unwrap();
        assert_eq!(spot.bids.len(), 1);

        let futures: DepthSnapshot =
            serde_json::from_str(r#"{"e":"depthUpdate","b":[["100.0","1.5"]],"a":[["100.5","2.0"]]}"#).unwrap();
        assert_eq!(futures.asks.len(), 1);
    }

    #[test]
    fn test_parse_level() {
        let level = parse_level(&["100.25".to_string(), "1.5".to_string()]).unwrap();
        assert_eq!(level.price, Decimal::from_str("100.25").unwrap());
        assert!(parse_level(&["x".to_string(), "1".to_string()]).is_none());
    }
}
