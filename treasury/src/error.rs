//! Reserve error types

use rust_decimal::Decimal;
use thiserror::Error;
use unity_core::TokenSymbol;
use unity_storage::StorageError;

/// Reserve ledger errors
#[derive(Error, Debug)]
pub enum ReserveError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Reserve overflow: {held} {token} held, cannot add {amount}")]
    Overflow {
        token: TokenSymbol,
        held: Decimal,
        amount: Decimal,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ReserveError>;
