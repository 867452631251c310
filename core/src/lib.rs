//! Unity Core Library
//!
//! Shared types for the UNITY index token: token symbols, per-token
//! amount tables, snapshot and transaction records, and configuration.

pub mod config;
pub mod records;
pub mod token;

pub use config::{ConfigError, EconomicsConfig, FeedConfig, LedgerConfig, LedgerMode, UnityConfig};
pub use records::{
    Deployment, PriceResult, PriceSnapshot, ReserveSnapshot, TransactionKind, TransactionStatus,
    UnityTransactionRecord,
};
pub use token::{
    CirculatingSupply, ReserveAmounts, TokenAmounts, TokenPrices, TokenSymbol, TokenWeights,
    UnknownToken,
};

use rust_decimal::{Decimal, RoundingStrategy};

/// Economic constants
pub mod constants {
    use crate::token::CirculatingSupply;
    use rust_decimal::Decimal;

    /// Fractional digits kept on every persisted quantity
    pub const PERSIST_SCALE: u32 = 8;

    /// Burn fee (0.5%)
    pub const BURN_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

    /// Utility multiplier of the platform token (1.2x)
    pub const PLATFORM_UTILITY_WEIGHT: Decimal = Decimal::from_parts(12, 0, 0, false, 1);

    /// Supply assumed for a token whose circulating supply is unknown
    pub const FALLBACK_SUPPLY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

    /// Address credited when mock mode has no operator wallet
    pub const MOCK_OPERATOR_ADDRESS: &str = "0xMOCK_ADMIN";

    pub fn default_circulating_supply() -> CirculatingSupply {
        CirculatingSupply::new(
            Decimal::from(86_712_634_000u64),
            Decimal::from(96_000_000_000u64),
            Decimal::from(100_000_000u64),
        )
    }

    /// Last-resort USD prices when no live, cached or stored price exists
    pub fn default_prices() -> crate::token::TokenPrices {
        crate::token::TokenPrices::new(
            Decimal::new(3, 2),
            Decimal::new(2, 3),
            Decimal::new(5, 2),
        )
    }
}

/// Round to the persisted precision
pub fn round_persisted(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(constants::PERSIST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
