//! Pricing error types

use std::time::Duration;
use thiserror::Error;
use unity_core::TokenSymbol;
use unity_storage::StorageError;

/// Failure of a single price source call. Recovered by the feed's
/// fallback chain and never returned to pricing callers.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price source timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid price for {token}: {value}")]
    InvalidPrice { token: TokenSymbol, value: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Price feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, PricingError>;
