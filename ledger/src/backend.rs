//! Ledger backend abstraction
//!
//! A backend owns UNITY balances and total supply. The mock and
//! chain-backed implementations must behave identically: balances never
//! go negative, burn and transfer check the holder's balance, and every
//! mutation returns a transaction hash.

use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use unity_core::LedgerMode;

pub use unity_core::Deployment;

#[async_trait]
pub trait LedgerBackend: Send + Sync {
    fn mode(&self) -> LedgerMode;

    /// Wallet that deploys the contract and holds the reserve
    fn operator_address(&self) -> Option<&str>;

    /// `None` until `deploy` succeeds
    fn deployment(&self) -> Option<Deployment>;

    /// Deploy the contract, crediting `initial_supply` to the operator.
    /// Fails with `AlreadyDeployed` on a second call.
    async fn deploy(&self, name: &str, symbol: &str, initial_supply: Decimal)
        -> Result<Deployment>;

    async fn mint(&self, to: &str, amount: Decimal) -> Result<String>;

    async fn burn(&self, from: &str, amount: Decimal) -> Result<String>;

    async fn transfer(&self, from: &str, to: &str, amount: Decimal) -> Result<String>;

    /// Zero for unknown addresses and before deployment
    async fn balance_of(&self, address: &str) -> Result<Decimal>;

    async fn total_supply(&self) -> Result<Decimal>;
}
