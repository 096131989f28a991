//! Bounded alert log with duplicate suppression and a notification side
//! effect.
//!
//! The store is the single owner of alert bookkeeping: the scanner offers
//! candidates, the store decides. A candidate is rejected when the same
//! symbol and kind was accepted within the cooldown window; acceptance
//! prepends the event, truncates the log to capacity, and fires the sink
//! exactly once. Sink failures never affect bookkeeping.

use crate::engine::config;
use chrono::Utc;
use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Alert classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    VolumeSpike,
    PriceSurge,
    PriceDump,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::VolumeSpike => "VOLUME_SPIKE",
            AlertKind::PriceSurge => "PRICE_SURGE",
            AlertKind::PriceDump => "PRICE_DUMP",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One accepted alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub id: u64,
    pub symbol: String,
    pub kind: AlertKind,
    /// Percent magnitude; signed for price moves.
    pub magnitude: f64,
    pub message: String,
    /// Acceptance time, epoch milliseconds.
    pub timestamp: i64,
}

/// Side effect fired once per accepted alert.
///
/// Implementations must contain their own failures; the trigger returns
/// nothing and the store never inspects the outcome.
pub trait NotificationSink: Send {
    fn notify(&self);
}

/// Default sink: rings the terminal bell. Write failures are logged and
/// swallowed.
pub struct BellSink;

impl NotificationSink for BellSink {
    fn notify(&self) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            warn!("alert bell failed: {}", e);
        }
    }
}

fn format_message(kind: AlertKind, magnitude: f64) -> String {
    match kind {
        AlertKind::VolumeSpike => format!("Volume spike ({:.1}%)", magnitude),
        AlertKind::PriceSurge => format!("Price surge ({:.2}%)", magnitude.abs()),
        AlertKind::PriceDump => format!("Price dump ({:.2}%)", magnitude.abs()),
    }
}

/// Time-ordered alert log, newest first.
pub struct AlertStore {
    log: VecDeque<AlertEvent>,
    capacity: usize,
    cooldown_ms: i64,
    next_id: u64,
    sink: Box<dyn NotificationSink>,
}

impl AlertStore {
    /// Store with capacity and cooldown taken from the environment config.
    pub fn new(sink: Box<dyn NotificationSink>) -> Self {
        Self::with_limits(sink, config::alert_capacity(), config::alert_cooldown())
    }

    pub fn with_limits(sink: Box<dyn NotificationSink>, capacity: usize, cooldown: Duration) -> Self {
        Self {
            log: VecDeque::with_capacity(capacity),
            capacity,
            cooldown_ms: cooldown.as_millis() as i64,
            next_id: 0,
            sink,
        }
    }

    /// Offer a candidate alert; returns whether it was accepted.
    ///
    /// The dedup window is evaluated against wall clock at the moment of the
    /// call, not against any upstream event time.
    pub fn offer(&mut self, symbol: &str, kind: AlertKind, magnitude: f64) -> bool {
        self.offer_at(symbol, kind, magnitude, Utc::now().timestamp_millis())
    }

    pub(crate) fn offer_at(&mut self, symbol: &str, kind: AlertKind, magnitude: f64, now_ms: i64) -> bool {
        let duplicate = self
            .log
            .iter()
            .any(|a| a.symbol == symbol && a.kind == kind && now_ms - a.timestamp < self.cooldown_ms);
        if duplicate {
            debug!("suppressed repeat {} alert for {}", kind, symbol);
            return false;
        }
        self.append(symbol, kind, magnitude, now_ms);
        true
    }

    /// Append an alert unconditionally, bypassing the dedup window. Used to
    /// exercise the notification pipeline without live data.
    pub fn test_alert(&mut self, symbol: &str, kind: AlertKind, magnitude: f64) {
        self.append(symbol, kind, magnitude, Utc::now().timestamp_millis());
    }

    fn append(&mut self, symbol: &str, kind: AlertKind, magnitude: f64, now_ms: i64) {
        let event = AlertEvent {
            id: self.next_id,
            symbol: symbol.to_string(),
            kind,
            magnitude,
            message: format_message(kind, magnitude),
            timestamp: now_ms,
        };
        self.next_id += 1;

        info!(symbol = %event.symbol, kind = %event.kind, "{}", event.message);

        self.log.push_front(event);
        while self.log.len() > self.capacity {
            self.log.pop_back();
        }

        self.sink.notify();
    }

    /// Empty the log unconditionally.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Accepted alerts, newest first.
    pub fn events(&self) -> impl Iterator<Item = &AlertEvent> {
        self.log.iter()
    }

    pub fn latest(&self) -> Option<&AlertEvent> {
        self.log.front()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    impl NotificationSink for CountingSink {
        fn notify(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn store_with_counter() -> (AlertStore, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let store = AlertStore::with_limits(
            Box::new(CountingSink(Arc::clone(&fired))),
            50,
            Duration::from_secs(60),
        );
        (store, fired)
    }

    #[test]
    fn test_repeat_within_cooldown_rejected() {
        let (mut store, fired) = store_with_counter();
        assert!(store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 1_000));
        // 5 seconds later: same symbol and kind, suppressed.
        assert!(!store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 45.0, 6_000));
        assert_eq!(store.len(), 1);
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_repeat_after_cooldown_accepted() {
        let (mut store, _) = store_with_counter();
        assert!(store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 1_000));
        // 61 seconds later the window has lapsed.
        assert!(store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 45.0, 62_000));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_different_kind_not_suppressed() {
        let (mut store, _) = store_with_counter();
        assert!(store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 1_000));
        assert!(store.offer_at("BTCUSDT", AlertKind::PriceSurge, 12.0, 2_000));
        assert!(store.offer_at("ETHUSDT", AlertKind::VolumeSpike, 33.0, 3_000));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut store = AlertStore::with_limits(
            Box::new(CountingSink(Arc::clone(&fired))),
            50,
            Duration::from_secs(60),
        );
        for i in 0..60i64 {
            // Distinct symbols so nothing is deduplicated.
            assert!(store.offer_at(&format!("SYM{}USDT", i), AlertKind::PriceDump, -12.0, i * 1_000));
        }
        assert_eq!(store.len(), 50);
        // Newest first; the 10 oldest were evicted.
        assert_eq!(store.latest().unwrap().symbol, "SYM59USDT");
        assert_eq!(store.events().last().unwrap().symbol, "SYM10USDT");
        assert_eq!(fired.load(Ordering::Relaxed), 60);
    }

    #[test]
    fn test_sink_fires_once_per_accepted_only() {
        let (mut store, fired) = store_with_counter();
        assert!(store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 1_000));
        assert!(!store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 2_000));
        assert!(!store.offer_at("BTCUSDT", AlertKind::VolumeSpike, 40.0, 3_000));
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_test_alert_bypasses_dedup() {
        let (mut store, fired) = store_with_counter();
        store.test_alert("BTCUSDT", AlertKind::VolumeSpike, 45.2);
        store.test_alert("BTCUSDT", AlertKind::VolumeSpike, 45.2);
        assert_eq!(store.len(), 2);
        assert_eq!(fired.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_clear() {
        let (mut store, _) = store_with_counter();
        store.test_alert("BTCUSDT", AlertKind::PriceSurge, 12.5);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_messages() {
        assert_eq!(format_message(AlertKind::VolumeSpike, 41.26), "Volume spike (41.3%)");
        assert_eq!(format_message(AlertKind::PriceSurge, 12.5), "Price surge (12.50%)");
        assert_eq!(format_message(AlertKind::PriceDump, -15.2), "Price dump (15.20%)");
    }

    #[test]
    fn test_ids_are_unique() {
        let (mut store, _) = store_with_counter();
        store.test_alert("A", AlertKind::PriceSurge, 11.0);
        store.test_alert("B", AlertKind::PriceSurge, 11.0);
        let ids: Vec<u64> = store.events().map(|e| e.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
