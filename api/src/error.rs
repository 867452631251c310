//! API Error Handling

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use unity_core::UnknownToken;
use unity_economics::PricingError;
use unity_ledger::LedgerError;
use unity_storage::StorageError;
use unity_treasury::ReserveError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        address: String,
        have: Decimal,
        need: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Operator wallet not configured")]
    WalletNotConfigured,

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("Unity contract not deployed")]
    NotDeployed,

    #[error("Unity contract already deployed at {0}")]
    AlreadyDeployed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InsufficientBalance { .. } => "insufficient_balance",
            ApiError::InvalidAmount(_) => "invalid_amount",
            ApiError::InvalidToken(_) => "invalid_token",
            ApiError::WalletNotConfigured => "wallet_not_configured",
            ApiError::PriceUnavailable(_) => "price_unavailable",
            ApiError::NotDeployed => "not_deployed",
            ApiError::AlreadyDeployed(_) => "already_deployed",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status a route layer should answer with
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InsufficientBalance { .. }
            | ApiError::InvalidAmount(_)
            | ApiError::InvalidToken(_)
            | ApiError::AlreadyDeployed(_)
            | ApiError::BadRequest(_) => 400,
            ApiError::NotDeployed => 404,
            ApiError::WalletNotConfigured => 503,
            ApiError::PriceUnavailable(_) | ApiError::Internal(_) => 500,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let message = match self {
            ApiError::InsufficientBalance { address, have, need } => format!(
                "{} has {} UNITY but tried to use {} UNITY",
                address, have, need
            ),
            other => other.to_string(),
        };

        json!({
            "error": self.code(),
            "message": message,
        })
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(amount) => ApiError::InvalidAmount(amount.to_string()),
            LedgerError::InsufficientBalance {
                address,
                requested,
                available,
            } => ApiError::InsufficientBalance {
                address,
                have: available,
                need: requested,
            },
            LedgerError::AlreadyDeployed(address) => ApiError::AlreadyDeployed(address),
            LedgerError::NotDeployed => ApiError::NotDeployed,
            LedgerError::WalletNotConfigured => ApiError::WalletNotConfigured,
            LedgerError::PriceUnavailable(msg) => ApiError::PriceUnavailable(msg),
            LedgerError::Reserve(err) => err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::FeedUnavailable(msg) => ApiError::PriceUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<UnknownToken> for ApiError {
    fn from(err: UnknownToken) -> Self {
        ApiError::InvalidToken(err.0)
    }
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::InvalidAmount(amount) => ApiError::InvalidAmount(amount.to_string()),
            overflow @ ReserveError::Overflow { .. } => {
                ApiError::InvalidAmount(overflow.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_errors_keep_their_codes() {
        let err: ApiError = LedgerError::InsufficientBalance {
            address: "0xa".to_string(),
            requested: dec!(50),
            available: dec!(10),
        }
        .into();
        assert_eq!(err.code(), "insufficient_balance");
        assert_eq!(err.status(), 400);
        assert_eq!(
            err.to_json()["message"],
            "0xa has 10 UNITY but tried to use 50 UNITY"
        );

        let err: ApiError = LedgerError::WalletNotConfigured.into();
        assert_eq!(err.code(), "wallet_not_configured");
        assert_eq!(err.status(), 503);

        let err: ApiError = LedgerError::Settlement("timeout".to_string()).into();
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn test_feed_unavailable_is_price_unavailable() {
        let err: ApiError = PricingError::FeedUnavailable("down".to_string()).into();
        assert_eq!(err.code(), "price_unavailable");
        assert_eq!(err.to_json()["error"], "price_unavailable");
    }

    #[test]
    fn test_reserve_overflow_is_invalid_amount() {
        let err: ApiError = LedgerError::Reserve(ReserveError::Overflow {
            token: unity_core::TokenSymbol::Vet,
            held: rust_decimal::Decimal::MAX,
            amount: dec!(1),
        })
        .into();
        assert_eq!(err.code(), "invalid_amount");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_unknown_token() {
        let err: ApiError = "DOGE".parse::<unity_core::TokenSymbol>().unwrap_err().into();
        assert_eq!(err.code(), "invalid_token");
        assert_eq!(err.status(), 400);
    }
}
