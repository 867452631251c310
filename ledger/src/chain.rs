//! Chain-backed ledger
//!
//! Delegates balances and supply to a settlement layer. Balance checks
//! happen here before a burn or transfer is submitted so a rejected
//! request never reaches the settlement layer.

use crate::backend::{Deployment, LedgerBackend};
use crate::error::{LedgerError, Result};
use crate::settlement::SettlementClient;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use unity_core::LedgerMode;
use unity_storage::SnapshotStore;

pub struct ChainLedger<C: SettlementClient> {
    client: C,
    operator: Option<String>,
    deployment: RwLock<Option<Deployment>>,
}

impl<C: SettlementClient> ChainLedger<C> {
    pub fn new(client: C, operator: Option<String>) -> Self {
        Self {
            client,
            operator,
            deployment: RwLock::new(None),
        }
    }

    /// Attach to a contract deployed by an earlier process
    pub fn with_deployment(self, deployment: Deployment) -> Self {
        *self.deployment.write() = Some(deployment);
        self
    }

    /// Attach to the last chain deployment recorded in `store`, if any
    pub fn reattach(self, store: &dyn SnapshotStore) -> Result<Self> {
        match store.latest_deployment(LedgerMode::Chain)? {
            Some(deployment) => {
                log::info!(
                    "⛓️  Reattached to Unity contract at {} (deployed {})",
                    deployment.address,
                    deployment.deployed_at
                );
                Ok(self.with_deployment(deployment))
            }
            None => Ok(self),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn operator(&self) -> Result<&str> {
        self.operator
            .as_deref()
            .ok_or(LedgerError::WalletNotConfigured)
    }

    fn contract(&self) -> Result<String> {
        self.deployment
            .read()
            .as_ref()
            .map(|d| d.address.clone())
            .ok_or(LedgerError::NotDeployed)
    }

    async fn require_balance(&self, contract: &str, address: &str, amount: Decimal) -> Result<()> {
        let available = self.client.balance_of(contract, address).await?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: address.to_string(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<C: SettlementClient> LedgerBackend for ChainLedger<C> {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Chain
    }

    fn operator_address(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    fn deployment(&self) -> Option<Deployment> {
        self.deployment.read().clone()
    }

    async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        initial_supply: Decimal,
    ) -> Result<Deployment> {
        let operator = self.operator()?;
        let existing = self.deployment.read().as_ref().map(|d| d.address.clone());
        if let Some(address) = existing {
            return Err(LedgerError::AlreadyDeployed(address));
        }

        log::info!("🚀 Deploying {} contract to settlement layer...", symbol);
        let address = self
            .client
            .deploy(operator, name, symbol, initial_supply)
            .await?;

        let mut slot = self.deployment.write();
        // A concurrent deploy may have finished while we were waiting
        if let Some(existing) = slot.as_ref() {
            return Err(LedgerError::AlreadyDeployed(existing.address.clone()));
        }
        let deployment = Deployment {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            mode: LedgerMode::Chain,
            initial_supply,
            deployed_at: Utc::now(),
        };
        *slot = Some(deployment.clone());

        log::info!("✅ Unity contract deployed at: {}", deployment.address);
        Ok(deployment)
    }

    async fn mint(&self, to: &str, amount: Decimal) -> Result<String> {
        let operator = self.operator()?;
        let contract = self.contract()?;

        let tx_hash = self.client.mint(&contract, operator, to, amount).await?;
        log::info!("⛓️  Mint: {} UNITY to {} (tx: {})", amount, to, tx_hash);
        Ok(tx_hash)
    }

    async fn burn(&self, from: &str, amount: Decimal) -> Result<String> {
        let operator = self.operator()?;
        let contract = self.contract()?;
        self.require_balance(&contract, from, amount).await?;

        let tx_hash = self.client.burn(&contract, operator, from, amount).await?;
        log::info!("⛓️  Burn: {} UNITY from {} (tx: {})", amount, from, tx_hash);
        Ok(tx_hash)
    }

    async fn transfer(&self, from: &str, to: &str, amount: Decimal) -> Result<String> {
        self.operator()?;
        let contract = self.contract()?;
        self.require_balance(&contract, from, amount).await?;

        let tx_hash = self.client.transfer(&contract, from, to, amount).await?;
        log::info!(
            "⛓️  Transfer: {} UNITY from {} to {} (tx: {})",
            amount,
            from,
            to,
            tx_hash
        );
        Ok(tx_hash)
    }

    async fn balance_of(&self, address: &str) -> Result<Decimal> {
        match self.contract() {
            Ok(contract) => self.client.balance_of(&contract, address).await,
            Err(_) => Ok(Decimal::ZERO),
        }
    }

    async fn total_supply(&self) -> Result<Decimal> {
        match self.contract() {
            Ok(contract) => self.client.total_supply(&contract).await,
            Err(_) => Ok(Decimal::ZERO),
        }
    }
}
