//! Lifecycle scope tying feeds and pollers to the active selection.
//!
//! A session owns one ticker feed for the market segment, plus the symbol
//! feed and chart poller for the currently selected symbol. Switching the
//! symbol, market, or chart interval aborts the owned tasks and resets the
//! owned state before spawning replacements, so no torn-down task can keep
//! mutating state and no stale data survives a switch.

use crate::engine::feed::{self, FeedStatus};
use crate::engine::klines;
use crate::engine::market::SymbolMarket;
use crate::engine::tickers::TickerBoard;
use crate::engine::types::{Kline, KlineInterval, MarketType};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

/// Running feed/poll context for one market selection.
pub struct MarketSession {
    market: MarketType,
    symbol: String,
    interval: KlineInterval,

    board: Arc<Mutex<TickerBoard>>,
    symbol_market: Arc<Mutex<SymbolMarket>>,
    chart: Arc<Mutex<Vec<Kline>>>,

    ticker_status_rx: watch::Receiver<FeedStatus>,
    symbol_status_rx: watch::Receiver<FeedStatus>,

    ticker_feed: JoinHandle<()>,
    symbol_feed: JoinHandle<()>,
    chart_poll: JoinHandle<()>,
}

impl MarketSession {
    /// Spawn all feeds and pollers for an initial selection.
    pub fn start(symbol: impl Into<String>, interval: KlineInterval, market: MarketType) -> Self {
        let symbol = symbol.into();
        let board = Arc::new(Mutex::new(TickerBoard::new()));
        let symbol_market = Arc::new(Mutex::new(SymbolMarket::new()));
        let chart = Arc::new(Mutex::new(Vec::new()));

        let (ticker_tx, ticker_status_rx) = watch::channel(FeedStatus::Disconnected);
        let ticker_feed = feed::spawn_ticker_feed(market, Arc::clone(&board), ticker_tx);

        let (symbol_tx, symbol_status_rx) = watch::channel(FeedStatus::Disconnected);
        let symbol_feed =
            feed::spawn_symbol_feed(symbol.clone(), market, Arc::clone(&symbol_market), symbol_tx);

        let chart_poll =
            klines::spawn_chart_poll(symbol.clone(), interval, market, Arc::clone(&chart));

        Self {
            market,
            symbol,
            interval,
            board,
            symbol_market,
            chart,
            ticker_status_rx,
            symbol_status_rx,
            ticker_feed,
            symbol_feed,
            chart_poll,
        }
    }

    /// Pivot the session to a new symbol. Also the entry point for the
    /// alert-follow effect: pass an alerted symbol to inspect it live.
    pub async fn select_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if symbol == self.symbol {
            return;
        }
        info!("switching active symbol {} -> {}", self.symbol, symbol);
        self.symbol = symbol;
        self.respawn_symbol_scope().await;
    }

    /// Switch market segment. Replaces every subscription, ticker feed
    /// included, and clears the board so no cross-market entries linger.
    pub async fn set_market(&mut self, market: MarketType) {
        if market == self.market {
            return;
        }
        info!("switching market {} -> {}", self.market.label(), market.label());
        self.market = market;

        self.ticker_feed.abort();
        self.board.lock().await.reset();
        let (ticker_tx, ticker_status_rx) = watch::channel(FeedStatus::Disconnected);
        self.ticker_feed = feed::spawn_ticker_feed(market, Arc::clone(&self.board), ticker_tx);
        self.ticker_status_rx = ticker_status_rx;

        self.respawn_symbol_scope().await;
    }

    /// Change the chart candle interval; only the poller is replaced.
    pub async fn set_interval(&mut self, interval: KlineInterval) {
        if interval == self.interval {
            return;
        }
        self.interval = interval;
        self.chart_poll.abort();
        self.chart.lock().await.clear();
        self.chart_poll = klines::spawn_chart_poll(
            self.symbol.clone(),
            interval,
            self.market,
            Arc::clone(&self.chart),
        );
    }

    /// Tear down and replace everything scoped to the active symbol.
    ///
    /// The old tasks are aborted first, then the state is cleared under its
    /// lock, so the replacement feed's first message lands on empty
    /// collections.
    async fn respawn_symbol_scope(&mut self) {
        self.symbol_feed.abort();
        self.chart_poll.abort();

        self.symbol_market.lock().await.reset();
        self.chart.lock().await.clear();

        let (symbol_tx, symbol_status_rx) = watch::channel(FeedStatus::Disconnected);
        self.symbol_feed = feed::spawn_symbol_feed(
            self.symbol.clone(),
            self.market,
            Arc::clone(&self.symbol_market),
            symbol_tx,
        );
        self.symbol_status_rx = symbol_status_rx;

        self.chart_poll = klines::spawn_chart_poll(
            self.symbol.clone(),
            self.interval,
            self.market,
            Arc::clone(&self.chart),
        );
    }

    /// Abort all owned tasks.
    pub fn shutdown(self) {
        self.ticker_feed.abort();
        self.symbol_feed.abort();
        self.chart_poll.abort();
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn market(&self) -> MarketType {
        self.market
    }

    pub fn interval(&self) -> KlineInterval {
        self.interval
    }

    /// Shared ticker board handle, for the scanner.
    pub fn board(&self) -> Arc<Mutex<TickerBoard>> {
        Arc::clone(&self.board)
    }

    pub fn symbol_market(&self) -> Arc<Mutex<SymbolMarket>> {
        Arc::clone(&self.symbol_market)
    }

    pub fn chart(&self) -> Arc<Mutex<Vec<Kline>>> {
        Arc::clone(&self.chart)
    }

    pub fn ticker_status(&self) -> FeedStatus {
        *self.ticker_status_rx.borrow()
    }

    pub fn symbol_status(&self) -> FeedStatus {
        *self.symbol_status_rx.borrow()
    }
}
