//! Environment-driven engine configuration.
//!
//! Each knob is read once and cached; defaults match the live deployment.

use std::sync::OnceLock;
use std::time::Duration;

/// Quote-asset suffix the ticker feed is filtered to (env: `SENTINEL_QUOTE`).
pub fn quote_suffix() -> &'static str {
    static QUOTE: OnceLock<String> = OnceLock::new();
    QUOTE.get_or_init(|| {
        std::env::var("SENTINEL_QUOTE").unwrap_or_else(|_| "USDT".to_string())
    })
}

/// Anomaly scan period (env: `SENTINEL_SCAN_SECS`, default 30s).
pub fn scan_interval() -> Duration {
    static SECS: OnceLock<u64> = OnceLock::new();
    Duration::from_secs(*SECS.get_or_init(|| {
        std::env::var("SENTINEL_SCAN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30)
    }))
}

/// How many top-volume symbols each scan cycle evaluates
/// (env: `SENTINEL_SCAN_TOP`, default 20).
pub fn scan_top_n() -> usize {
    static N: OnceLock<usize> = OnceLock::new();
    *N.get_or_init(|| {
        std::env::var("SENTINEL_SCAN_TOP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20)
    })
}

/// Chart candle refresh period for the active symbol
/// (env: `SENTINEL_POLL_SECS`, default 5s).
pub fn chart_poll_interval() -> Duration {
    static SECS: OnceLock<u64> = OnceLock::new();
    Duration::from_secs(*SECS.get_or_init(|| {
        std::env::var("SENTINEL_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5)
    }))
}

/// Minimum gap before a repeat alert of the same symbol and kind is accepted
/// (env: `SENTINEL_ALERT_COOLDOWN_SECS`, default 60s).
pub fn alert_cooldown() -> Duration {
    static SECS: OnceLock<u64> = OnceLock::new();
    Duration::from_secs(*SECS.get_or_init(|| {
        std::env::var("SENTINEL_ALERT_COOLDOWN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60)
    }))
}

/// Bound on the alert log (env: `SENTINEL_ALERT_CAPACITY`, default 50).
pub fn alert_capacity() -> usize {
    static CAP: OnceLock<usize> = OnceLock::new();
    *CAP.get_or_init(|| {
        std::env::var("SENTINEL_ALERT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50)
    })
}

/// Delay between feed reconnection attempts
/// (env: `SENTINEL_RECONNECT_SECS`, default 5s).
pub fn reconnect_delay() -> Duration {
    static SECS: OnceLock<u64> = OnceLock::new();
    Duration::from_secs(*SECS.get_or_init(|| {
        std::env::var("SENTINEL_RECONNECT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5)
    }))
}
