//! Errors raised by the REST polling boundary.
//!
//! Feed-level failures never cross component boundaries as errors; the
//! fail-soft wrapper in [`crate::engine::klines`] converts everything here
//! into an empty result.

use thiserror::Error;

/// Failure while fetching candle history.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {0}")]
    Status(reqwest::StatusCode),
}
