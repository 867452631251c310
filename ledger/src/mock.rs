//! In-process ledger used when no settlement layer is configured

use crate::backend::{Deployment, LedgerBackend};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use unity_core::constants::MOCK_OPERATOR_ADDRESS;
use unity_core::{LedgerConfig, LedgerMode};

#[derive(Debug, Default)]
struct MockState {
    deployment: Option<Deployment>,
    balances: HashMap<String, Decimal>,
    total_supply: Decimal,
    nonce: u64,
}

impl MockState {
    fn balance(&self, address: &str) -> Decimal {
        self.balances.get(address).copied().unwrap_or(Decimal::ZERO)
    }

    fn require_deployed(&self) -> Result<()> {
        if self.deployment.is_none() {
            return Err(LedgerError::NotDeployed);
        }
        Ok(())
    }

    fn require_balance(&self, address: &str, amount: Decimal) -> Result<Decimal> {
        let available = self.balance(address);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: address.to_string(),
                requested: amount,
                available,
            });
        }
        Ok(available)
    }

    /// `current + amount`, or `InvalidAmount` when it does not fit
    fn credited(current: Decimal, amount: Decimal) -> Result<Decimal> {
        current
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount(amount))
    }

    fn next_digest(&mut self, label: &str) -> [u8; 32] {
        self.nonce += 1;
        let data = format!(
            "{}:{}:{}",
            label,
            self.nonce,
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }

    fn next_tx_hash(&mut self, label: &str) -> String {
        format!("0x{}", hex::encode(self.next_digest(label)))
    }
}

/// Balances and supply in one lock so every operation is atomic
pub struct MockLedger {
    operator: String,
    state: RwLock<MockState>,
}

impl MockLedger {
    pub fn new(operator: Option<String>) -> Self {
        Self {
            operator: operator.unwrap_or_else(|| MOCK_OPERATOR_ADDRESS.to_string()),
            state: RwLock::new(MockState::default()),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.operator_address.clone())
    }

    /// Sum of all balances, for conservation checks
    pub fn balance_sum(&self) -> Decimal {
        self.state.read().balances.values().copied().sum()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl LedgerBackend for MockLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Mock
    }

    fn operator_address(&self) -> Option<&str> {
        Some(&self.operator)
    }

    fn deployment(&self) -> Option<Deployment> {
        self.state.read().deployment.clone()
    }

    async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        initial_supply: Decimal,
    ) -> Result<Deployment> {
        let mut state = self.state.write();
        if let Some(existing) = &state.deployment {
            return Err(LedgerError::AlreadyDeployed(existing.address.clone()));
        }

        let operator_balance = MockState::credited(state.balance(&self.operator), initial_supply)?;
        let total_supply = MockState::credited(state.total_supply, initial_supply)?;

        let digest = state.next_digest(&format!("deploy:{}:{}", name, symbol));
        let deployment = Deployment {
            address: format!("0x{}", hex::encode(&digest[..20])),
            name: name.to_string(),
            symbol: symbol.to_string(),
            mode: LedgerMode::Mock,
            initial_supply,
            deployed_at: Utc::now(),
        };

        if initial_supply > Decimal::ZERO {
            state.balances.insert(self.operator.clone(), operator_balance);
            state.total_supply = total_supply;
        }
        state.deployment = Some(deployment.clone());

        log::info!(
            "🧪 Mock deployment: {} ({}) at {}",
            deployment.name,
            deployment.symbol,
            deployment.address
        );
        Ok(deployment)
    }

    async fn mint(&self, to: &str, amount: Decimal) -> Result<String> {
        let mut state = self.state.write();
        state.require_deployed()?;

        let balance = MockState::credited(state.balance(to), amount)?;
        let total_supply = MockState::credited(state.total_supply, amount)?;
        state.balances.insert(to.to_string(), balance);
        state.total_supply = total_supply;
        let tx_hash = state.next_tx_hash("mint");

        log::info!(
            "🧪 Mock mint: {} UNITY to {} (balance: {}, supply: {}, tx: {})",
            amount,
            to,
            balance,
            state.total_supply,
            tx_hash
        );
        Ok(tx_hash)
    }

    async fn burn(&self, from: &str, amount: Decimal) -> Result<String> {
        let mut state = self.state.write();
        state.require_deployed()?;
        let available = state.require_balance(from, amount)?;

        let balance = available - amount;
        state.balances.insert(from.to_string(), balance);
        state.total_supply -= amount;
        let tx_hash = state.next_tx_hash("burn");

        log::info!(
            "🧪 Mock burn: {} UNITY from {} (balance: {}, supply: {}, tx: {})",
            amount,
            from,
            balance,
            state.total_supply,
            tx_hash
        );
        Ok(tx_hash)
    }

    async fn transfer(&self, from: &str, to: &str, amount: Decimal) -> Result<String> {
        let mut state = self.state.write();
        state.require_deployed()?;
        let available = state.require_balance(from, amount)?;

        if from != to {
            let received = MockState::credited(state.balance(to), amount)?;
            state.balances.insert(from.to_string(), available - amount);
            state.balances.insert(to.to_string(), received);
        }
        let tx_hash = state.next_tx_hash("transfer");

        log::info!(
            "🧪 Mock transfer: {} UNITY from {} to {} (tx: {})",
            amount,
            from,
            to,
            tx_hash
        );
        Ok(tx_hash)
    }

    async fn balance_of(&self, address: &str) -> Result<Decimal> {
        Ok(self.state.read().balance(address))
    }

    async fn total_supply(&self) -> Result<Decimal> {
        Ok(self.state.read().total_supply)
    }
}
