//! Ledger error types

use rust_decimal::Decimal;
use thiserror::Error;
use unity_storage::StorageError;
use unity_treasury::ReserveError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Insufficient balance: {address} has {available} UNITY but tried to use {requested}")]
    InsufficientBalance {
        address: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Unity contract already deployed at {0}")]
    AlreadyDeployed(String),

    #[error("Unity contract not deployed")]
    NotDeployed,

    #[error("Operator wallet not configured")]
    WalletNotConfigured,

    #[error("Unable to fetch Unity price data: {0}")]
    PriceUnavailable(String),

    #[error("Settlement error: {0}")]
    Settlement(String),

    #[error("Reserve error: {0}")]
    Reserve(#[from] ReserveError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Settlement(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
