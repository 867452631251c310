//! Token Ledger - UNITY mint, burn and transfer
//!
//! Coordinates one ledger backend with the reserve ledger, the price
//! oracle and the transaction log. Mutations run one at a time behind a
//! write gate covering check, balance mutation, reserve snapshot and
//! transaction record. A burn fetches its price before entering the gate.
//! Validation failures return before anything is mutated.
//!
//! The reserve snapshot and transaction record of an operation are
//! written in one store call after the backend commits. If that write
//! fails the backend change is reversed and the reserves and supply
//! statistics are left as they were.

use crate::backend::{Deployment, LedgerBackend};
use crate::error::{LedgerError, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use unity_core::constants::BURN_FEE_RATE;
use unity_core::{
    LedgerMode, ReserveAmounts, ReserveSnapshot, TokenSymbol, TransactionKind,
    UnityTransactionRecord,
};
use unity_economics::{BurnQuote, PriceCalculator, PriceOracle, SupplyManager, SupplyStats};
use unity_storage::SnapshotStore;
use unity_treasury::ReserveLedger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub tx_hash: String,
    pub unity_minted: Decimal,
    pub reserves: ReserveSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnReceipt {
    pub tx_hash: String,
    pub unity_burned: Decimal,
    pub token: TokenSymbol,
    pub token_released: Decimal,
    /// The reserve held less than the release and was floored at zero
    pub reserve_clamped: bool,
    pub quote: BurnQuote,
    pub reserves: ReserveSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub address: String,
    pub mode: LedgerMode,
    pub name: String,
    pub symbol: String,
    pub total_supply: Decimal,
    pub reserve_address: String,
}

pub struct TokenLedger {
    backend: Arc<dyn LedgerBackend>,
    reserves: Arc<ReserveLedger>,
    oracle: Arc<PriceOracle>,
    store: Arc<dyn SnapshotStore>,
    burn_fee_rate: Decimal,
    supply: Mutex<SupplyManager>,
    write_gate: tokio::sync::Mutex<()>,
}

/// A backend mutation that may have to be reversed
enum Applied<'a> {
    Mint { to: &'a str, amount: Decimal },
    Burn { from: &'a str, amount: Decimal },
    Transfer { from: &'a str, to: &'a str, amount: Decimal },
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

impl TokenLedger {
    pub fn new(
        backend: Arc<dyn LedgerBackend>,
        reserves: Arc<ReserveLedger>,
        oracle: Arc<PriceOracle>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            backend,
            reserves,
            oracle,
            store,
            burn_fee_rate: BURN_FEE_RATE,
            supply: Mutex::new(SupplyManager::new()),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_burn_fee_rate(mut self, rate: Decimal) -> Self {
        self.burn_fee_rate = rate;
        self
    }

    pub fn mode(&self) -> LedgerMode {
        self.backend.mode()
    }

    pub fn oracle(&self) -> &Arc<PriceOracle> {
        &self.oracle
    }

    pub fn reserves(&self) -> &Arc<ReserveLedger> {
        &self.reserves
    }

    fn contract_address(&self) -> Option<String> {
        self.backend.deployment().map(|d| d.address)
    }

    /// Deploy the UNITY contract and record an empty reserve for it
    pub async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        initial_supply: Decimal,
    ) -> Result<Deployment> {
        if initial_supply < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(initial_supply));
        }

        let _gate = self.write_gate.lock().await;
        let deployment = self.backend.deploy(name, symbol, initial_supply).await?;
        let opening = self
            .reserves
            .plan_snapshot(ReserveAmounts::ZERO, Some(deployment.address.clone()))?;
        // The contract exists once the backend deployed it, so a failed
        // write leaves it deployed but unrecorded
        if let Err(e) = self.store.append_deployment(&deployment, &opening) {
            log::error!(
                "❌ Contract {} deployed but not recorded: {}",
                deployment.address,
                e
            );
            return Err(e.into());
        }
        self.reserves.publish(&opening);
        *self.supply.lock() = SupplyManager::with_initial_supply(initial_supply);

        Ok(deployment)
    }

    /// Seed supply statistics from the backend after attaching to a
    /// contract deployed by an earlier process
    pub async fn resume(&self) -> Result<SupplyStats> {
        let _gate = self.write_gate.lock().await;
        if let Some(deployment) = self.backend.deployment() {
            let total_supply = self.backend.total_supply().await?;
            log::info!(
                "📒 Resumed {} at {} with supply {}",
                deployment.symbol,
                deployment.address,
                total_supply
            );
            *self.supply.lock() = SupplyManager::with_initial_supply(total_supply);
        }
        Ok(self.supply_stats())
    }

    pub fn deployment(&self) -> Option<Deployment> {
        self.backend.deployment()
    }

    pub async fn contract_info(&self) -> Result<ContractInfo> {
        let reserve_address = self
            .backend
            .operator_address()
            .ok_or(LedgerError::WalletNotConfigured)?
            .to_string();
        let deployment = self.backend.deployment().ok_or(LedgerError::NotDeployed)?;
        let total_supply = self.backend.total_supply().await?;

        Ok(ContractInfo {
            address: deployment.address,
            mode: deployment.mode,
            name: deployment.name,
            symbol: deployment.symbol,
            total_supply,
            reserve_address,
        })
    }

    /// Mint `amount` UNITY to `to`, backed by a reserve deposit
    pub async fn mint(
        &self,
        to: &str,
        amount: Decimal,
        deposit_token: TokenSymbol,
        deposit_amount: Decimal,
    ) -> Result<MintReceipt> {
        require_positive(amount)?;
        if deposit_amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(deposit_amount));
        }

        let _gate = self.write_gate.lock().await;
        let reserves =
            self.reserves
                .plan_deposit(deposit_token, deposit_amount, self.contract_address())?;
        let tx_hash = self.backend.mint(to, amount).await?;

        let record = UnityTransactionRecord::completed(
            TransactionKind::Mint,
            amount,
            Some(deposit_token),
            deposit_amount,
            tx_hash.clone(),
            json!({
                "recipientAddress": to,
                "reserves": reserves.amounts(),
            }),
        );
        self.persist(Some(&reserves), &record, Applied::Mint { to, amount })
            .await?;
        self.reserves.publish(&reserves);
        self.supply.lock().mint(amount);

        log::info!(
            "🪙 Minted {} UNITY to {} against {} {} (tx: {})",
            amount,
            to,
            deposit_amount,
            deposit_token,
            tx_hash
        );
        Ok(MintReceipt {
            tx_hash,
            unity_minted: amount,
            reserves,
        })
    }

    /// Burn `amount` UNITY from `from`, releasing `release_token` from the
    /// reserve at the current UNITY price less the burn fee
    pub async fn burn(
        &self,
        from: &str,
        amount: Decimal,
        release_token: TokenSymbol,
    ) -> Result<BurnReceipt> {
        require_positive(amount)?;
        if self.backend.deployment().is_none() {
            return Err(LedgerError::NotDeployed);
        }

        let available = self.backend.balance_of(from).await?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: from.to_string(),
                requested: amount,
                available,
            });
        }

        let price = self
            .oracle
            .latest_price()
            .await
            .map_err(|e| LedgerError::PriceUnavailable(e.to_string()))?;
        let quote = PriceCalculator::calculate_burn_release(
            amount,
            &price,
            release_token,
            self.burn_fee_rate,
        )
        .ok_or(LedgerError::InvalidAmount(amount))?;

        let _gate = self.write_gate.lock().await;
        let release =
            self.reserves
                .plan_release(release_token, quote.token_amount, self.contract_address())?;
        // The backend re-checks the balance under its own lock
        let tx_hash = self.backend.burn(from, amount).await?;

        let record = UnityTransactionRecord::completed(
            TransactionKind::Burn,
            amount,
            Some(release_token),
            quote.token_amount,
            tx_hash.clone(),
            json!({
                "userAddress": from,
                "reserves": release.snapshot.amounts(),
                "burnFee": self.burn_fee_rate,
                "unityPriceUsd": quote.unity_price_usd,
                "reserveClamped": release.clamped,
            }),
        );
        self.persist(Some(&release.snapshot), &record, Applied::Burn { from, amount })
            .await?;
        self.reserves.publish(&release.snapshot);
        self.supply.lock().burn(amount);

        if release.clamped {
            log::warn!(
                "⚠️  Release of {} {} exceeded the reserve, clamped to zero",
                quote.token_amount,
                release_token
            );
        }
        log::info!(
            "🔥 Burned {} UNITY from {} releasing {} {} (tx: {})",
            amount,
            from,
            quote.token_amount,
            release_token,
            tx_hash
        );
        Ok(BurnReceipt {
            tx_hash,
            unity_burned: amount,
            token: release_token,
            token_released: quote.token_amount,
            reserve_clamped: release.clamped,
            quote,
            reserves: release.snapshot,
        })
    }

    /// Move `amount` between two holders. Without a sender the operator
    /// wallet pays.
    pub async fn transfer(
        &self,
        from: Option<&str>,
        to: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        require_positive(amount)?;
        let from = match from {
            Some(address) => address.to_string(),
            None => self
                .backend
                .operator_address()
                .ok_or(LedgerError::WalletNotConfigured)?
                .to_string(),
        };

        let _gate = self.write_gate.lock().await;
        let tx_hash = self.backend.transfer(&from, to, amount).await?;

        let record = UnityTransactionRecord::completed(
            TransactionKind::Transfer,
            amount,
            None,
            Decimal::ZERO,
            tx_hash.clone(),
            json!({ "from": from, "to": to }),
        );
        self.persist(
            None,
            &record,
            Applied::Transfer {
                from: &from,
                to,
                amount,
            },
        )
        .await?;

        log::info!(
            "💸 Transferred {} UNITY from {} to {} (tx: {})",
            amount,
            from,
            to,
            tx_hash
        );
        Ok(TransferReceipt {
            tx_hash,
            from,
            to: to.to_string(),
            amount,
        })
    }

    /// Write the reserve snapshot and record of an applied mutation,
    /// reversing the mutation when the write fails
    async fn persist(
        &self,
        reserves: Option<&ReserveSnapshot>,
        record: &UnityTransactionRecord,
        applied: Applied<'_>,
    ) -> Result<()> {
        match self.store.append_ledger_entry(reserves, record) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("❌ Failed to record {} {}: {}", record.kind, record.tx_hash, e);
                self.revert(applied, &record.tx_hash).await;
                Err(e.into())
            }
        }
    }

    async fn revert(&self, applied: Applied<'_>, tx_hash: &str) {
        let result = match applied {
            Applied::Mint { to, amount } => self.backend.burn(to, amount).await,
            Applied::Burn { from, amount } => self.backend.mint(from, amount).await,
            Applied::Transfer { from, to, amount } => {
                self.backend.transfer(to, from, amount).await
            }
        };
        match result {
            Ok(revert_hash) => {
                log::warn!("↩️  Reverted {} (revert tx: {})", tx_hash, revert_hash)
            }
            Err(e) => log::error!("❌ Could not revert {}: {}", tx_hash, e),
        }
    }

    pub async fn balance_of(&self, address: &str) -> Result<Decimal> {
        self.backend.balance_of(address).await
    }

    pub async fn total_supply(&self) -> Result<Decimal> {
        self.backend.total_supply().await
    }

    pub fn supply_stats(&self) -> SupplyStats {
        *self.supply.lock().stats()
    }

    /// Newest first
    pub fn transactions(&self, limit: usize) -> Result<Vec<UnityTransactionRecord>> {
        Ok(self.store.transactions(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLedger;
    use rust_decimal_macros::dec;
    use unity_economics::{FixedPriceSource, PriceFeed, WeightEngine};
    use unity_storage::MemorySnapshotStore;

    fn ledger_with(backend: Arc<dyn LedgerBackend>) -> (Arc<MemorySnapshotStore>, TokenLedger) {
        let store = Arc::new(MemorySnapshotStore::new());
        let reserves = Arc::new(ReserveLedger::new(store.clone()).unwrap());
        let feed = Arc::new(PriceFeed::new(
            Arc::new(FixedPriceSource::default()),
            store.clone(),
        ));
        let oracle = Arc::new(PriceOracle::new(
            feed,
            reserves.clone(),
            store.clone(),
            WeightEngine::default(),
            unity_core::constants::default_circulating_supply(),
        ));
        let ledger = TokenLedger::new(backend, reserves, oracle, store.clone());
        (store, ledger)
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (store, ledger) = ledger_with(Arc::new(MockLedger::default()));
        ledger.deploy("Unity", "UNITY", dec!(0)).await.unwrap();

        let mint = ledger.mint("0xa", dec!(0), TokenSymbol::Vet, dec!(1)).await;
        assert!(matches!(mint, Err(LedgerError::InvalidAmount(_))));
        let burn = ledger.burn("0xa", dec!(-1), TokenSymbol::Vet).await;
        assert!(matches!(burn, Err(LedgerError::InvalidAmount(_))));
        let transfer = ledger.transfer(Some("0xa"), "0xb", dec!(0)).await;
        assert!(matches!(transfer, Err(LedgerError::InvalidAmount(_))));
        let deposit = ledger.mint("0xa", dec!(1), TokenSymbol::Vet, dec!(-1)).await;
        assert!(matches!(deposit, Err(LedgerError::InvalidAmount(_))));

        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_deploy_records_empty_reserve() {
        let (store, ledger) = ledger_with(Arc::new(MockLedger::default()));
        let deployment = ledger.deploy("Unity", "UNITY", dec!(500)).await.unwrap();

        let reserves = ledger.reserves().current();
        assert_eq!(reserves.contract_address.as_deref(), Some(deployment.address.as_str()));
        assert_eq!(reserves.amounts(), unity_core::ReserveAmounts::ZERO);
        assert_eq!(store.reserve_count(), 1);
        assert_eq!(ledger.supply_stats().circulating_supply, dec!(500));

        let again = ledger.deploy("Unity", "UNITY", dec!(0)).await;
        assert!(matches!(again, Err(LedgerError::AlreadyDeployed(_))));
        assert_eq!(store.reserve_count(), 1);
    }

    #[tokio::test]
    async fn test_contract_info() {
        let (_, ledger) = ledger_with(Arc::new(MockLedger::default()));
        assert!(matches!(
            ledger.contract_info().await,
            Err(LedgerError::NotDeployed)
        ));

        ledger.deploy("Unity", "UNITY", dec!(1000)).await.unwrap();
        let info = ledger.contract_info().await.unwrap();
        assert_eq!(info.symbol, "UNITY");
        assert_eq!(info.mode, LedgerMode::Mock);
        assert_eq!(info.total_supply, dec!(1000));
        assert_eq!(info.reserve_address, "0xMOCK_ADMIN");
    }

    #[tokio::test]
    async fn test_transfer_defaults_to_operator() {
        let (store, ledger) = ledger_with(Arc::new(MockLedger::default()));
        ledger.deploy("Unity", "UNITY", dec!(1000)).await.unwrap();

        let receipt = ledger.transfer(None, "0xuser", dec!(25)).await.unwrap();
        assert_eq!(receipt.from, "0xMOCK_ADMIN");
        assert_eq!(ledger.balance_of("0xuser").await.unwrap(), dec!(25));
        assert_eq!(ledger.balance_of("0xMOCK_ADMIN").await.unwrap(), dec!(975));
        assert_eq!(ledger.total_supply().await.unwrap(), dec!(1000));

        let record = &ledger.transactions(1).unwrap()[0];
        assert_eq!(record.kind, TransactionKind::Transfer);
        assert_eq!(record.metadata["to"], "0xuser");
        assert_eq!(store.reserve_count(), 1);
    }

    #[tokio::test]
    async fn test_mint_metadata_and_rate() {
        let (_, ledger) = ledger_with(Arc::new(MockLedger::default()));
        ledger.deploy("Unity", "UNITY", dec!(0)).await.unwrap();

        ledger
            .mint("0xa", dec!(100), TokenSymbol::Vet, dec!(5))
            .await
            .unwrap();

        let record = &ledger.transactions(10).unwrap()[0];
        assert_eq!(record.kind, TransactionKind::Mint);
        assert_eq!(record.token_type, Some(TokenSymbol::Vet));
        assert_eq!(record.exchange_rate, dec!(0.05));
        assert_eq!(record.metadata["recipientAddress"], "0xa");
        assert_eq!(record.metadata["reserves"]["VET"], "5");
    }
}
