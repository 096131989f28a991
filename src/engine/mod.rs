/// Engine modules for the market sentinel
pub mod alerts;
pub mod config;
pub mod error;
pub mod feed;
pub mod klines;
pub mod market;
pub mod scanner;
pub mod session;
pub mod tickers;
pub mod types;
