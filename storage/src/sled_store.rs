//! Sled-based persistence for snapshots and transaction records
//!
//! One tree per record kind. Keys are big-endian ids from
//! `Db::generate_id`, so tree order is append order and the last key is
//! the latest record. Values are JSON. Writes that span trees run in a
//! sled transaction.

use crate::{Result, SnapshotStore, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::Transactional;
use std::path::Path;
use unity_core::{Deployment, LedgerMode, PriceSnapshot, ReserveSnapshot, UnityTransactionRecord};

const PRICE_TREE: &str = "price_snapshots";
const RESERVE_TREE: &str = "reserve_snapshots";
const TRANSACTION_TREE: &str = "unity_transactions";
const DEPLOYMENT_TREE: &str = "deployments";

#[derive(Debug, Clone)]
pub struct SledSnapshotStore {
    db: sled::Db,
    prices: sled::Tree,
    reserves: sled::Tree,
    transactions: sled::Tree,
    deployments: sled::Tree,
    path: String,
}

impl SledSnapshotStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        if !path.as_ref().exists() {
            std::fs::create_dir_all(&path)?;
        }
        let db = sled::open(&path)?;
        log::debug!("Opened snapshot store at {}", path_str);

        Ok(Self {
            prices: db.open_tree(PRICE_TREE)?,
            reserves: db.open_tree(RESERVE_TREE)?,
            transactions: db.open_tree(TRANSACTION_TREE)?,
            deployments: db.open_tree(DEPLOYMENT_TREE)?,
            db,
            path: path_str,
        })
    }

    /// Get the database path
    pub fn path(&self) -> &str {
        &self.path
    }

    fn append<T: Serialize>(&self, tree: &sled::Tree, value: &T) -> Result<()> {
        let id = self.db.generate_id()?;
        let data = serde_json::to_vec(value)?;
        tree.insert(id.to_be_bytes(), data)?;

        // Flush so a snapshot survives a crash right after the operation
        tree.flush()?;
        Ok(())
    }

    /// Insert pre-encoded values into two trees in one transaction
    fn append_pair(
        &self,
        first: (&sled::Tree, Option<&[u8]>),
        second: (&sled::Tree, &[u8]),
    ) -> Result<()> {
        (first.0, second.0)
            .transaction(
                |(first_tx, second_tx)| -> std::result::Result<(), ConflictableTransactionError<()>> {
                    if let Some(data) = first.1 {
                        insert_next(first_tx, data)?;
                    }
                    insert_next(second_tx, second.1)
                },
            )
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Abort(()) => StorageError::Aborted,
                TransactionError::Storage(e) => StorageError::Database(e),
            })?;

        self.db.flush()?;
        Ok(())
    }

    fn latest<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Option<T>> {
        match tree.last()? {
            Some((_, data)) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn newest_first<T: DeserializeOwned>(tree: &sled::Tree, limit: usize) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for entry in tree.iter().rev().take(limit) {
            let (_, data) = entry?;
            items.push(serde_json::from_slice(&data)?);
        }
        Ok(items)
    }
}

fn insert_next(
    tree: &TransactionalTree,
    data: &[u8],
) -> std::result::Result<(), ConflictableTransactionError<()>> {
    let id = tree.generate_id()?;
    tree.insert(&id.to_be_bytes()[..], data)?;
    Ok(())
}

impl SnapshotStore for SledSnapshotStore {
    fn append_price_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        self.append(&self.prices, snapshot)
    }

    fn latest_price_snapshot(&self) -> Result<Option<PriceSnapshot>> {
        Self::latest(&self.prices)
    }

    fn price_history(&self, limit: usize) -> Result<Vec<PriceSnapshot>> {
        Self::newest_first(&self.prices, limit)
    }

    fn append_reserve_snapshot(&self, snapshot: &ReserveSnapshot) -> Result<()> {
        self.append(&self.reserves, snapshot)
    }

    fn latest_reserve_snapshot(&self) -> Result<Option<ReserveSnapshot>> {
        Self::latest(&self.reserves)
    }

    fn reserve_history(&self, limit: usize) -> Result<Vec<ReserveSnapshot>> {
        Self::newest_first(&self.reserves, limit)
    }

    fn append_transaction(&self, record: &UnityTransactionRecord) -> Result<()> {
        self.append(&self.transactions, record)
    }

    fn transactions(&self, limit: usize) -> Result<Vec<UnityTransactionRecord>> {
        Self::newest_first(&self.transactions, limit)
    }

    fn append_ledger_entry(
        &self,
        reserve: Option<&ReserveSnapshot>,
        record: &UnityTransactionRecord,
    ) -> Result<()> {
        let reserve_data = reserve.map(serde_json::to_vec).transpose()?;
        let record_data = serde_json::to_vec(record)?;
        self.append_pair(
            (&self.reserves, reserve_data.as_deref()),
            (&self.transactions, record_data.as_slice()),
        )
    }

    fn append_deployment(&self, deployment: &Deployment, reserve: &ReserveSnapshot) -> Result<()> {
        let deployment_data = serde_json::to_vec(deployment)?;
        let reserve_data = serde_json::to_vec(reserve)?;
        self.append_pair(
            (&self.deployments, Some(deployment_data.as_slice())),
            (&self.reserves, reserve_data.as_slice()),
        )
    }

    fn latest_deployment(&self, mode: LedgerMode) -> Result<Option<Deployment>> {
        for entry in self.deployments.iter().rev() {
            let (_, data) = entry?;
            let deployment: Deployment = serde_json::from_slice(&data)?;
            if deployment.mode == mode {
                return Ok(Some(deployment));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;
    use unity_core::{ReserveAmounts, TokenPrices, TokenSymbol, TokenWeights, TransactionKind};

    #[test]
    fn test_price_snapshot_survives_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = SledSnapshotStore::open(dir.path()).unwrap();
            let snapshot = PriceSnapshot::new(
                dec!(0.031),
                TokenPrices::new(dec!(0.03), dec!(0.002), dec!(0.05)),
                TokenWeights::new(dec!(0.5), dec!(0.25), dec!(0.25)),
                "coingecko",
                serde_json::json!({ "feedOrigin": "live" }),
            );
            store.append_price_snapshot(&snapshot).unwrap();
        }

        let store = SledSnapshotStore::open(dir.path()).unwrap();
        let latest = store.latest_price_snapshot().unwrap().unwrap();
        assert_eq!(latest.unity_price_usd, dec!(0.031));
        assert_eq!(latest.vtho_weight, dec!(0.25));
        assert_eq!(latest.metadata["feedOrigin"], "live");
    }

    #[test]
    fn test_latest_reserve_follows_append_order() {
        let dir = tempdir().unwrap();
        let store = SledSnapshotStore::open(dir.path()).unwrap();
        assert!(store.latest_reserve_snapshot().unwrap().is_none());

        for b3tr in [dec!(10), dec!(20), dec!(5)] {
            let snapshot = ReserveSnapshot::new(
                ReserveAmounts::new(dec!(0), dec!(0), b3tr),
                Some("0xcontract".to_string()),
            );
            store.append_reserve_snapshot(&snapshot).unwrap();
        }

        let latest = store.latest_reserve_snapshot().unwrap().unwrap();
        assert_eq!(latest.b3tr_amount, dec!(5));
        assert_eq!(latest.contract_address.as_deref(), Some("0xcontract"));

        let history = store.reserve_history(10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].b3tr_amount, dec!(10));
    }

    #[test]
    fn test_transactions_newest_first() {
        let dir = tempdir().unwrap();
        let store = SledSnapshotStore::open(dir.path()).unwrap();

        for (i, kind) in [TransactionKind::Mint, TransactionKind::Burn]
            .into_iter()
            .enumerate()
        {
            let record = UnityTransactionRecord::completed(
                kind,
                dec!(10),
                Some(TokenSymbol::Vet),
                dec!(1),
                format!("0x{:02}", i),
                serde_json::Value::Null,
            );
            store.append_transaction(&record).unwrap();
        }

        let records = store.transactions(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransactionKind::Burn);
        assert_eq!(records[0].tx_hash, "0x01");
    }

    #[test]
    fn test_ledger_entry_and_deployment_survive_reopen() {
        let dir = tempdir().unwrap();
        let deployment = Deployment {
            address: "0xchain".to_string(),
            name: "Unity".to_string(),
            symbol: "UNITY".to_string(),
            mode: LedgerMode::Chain,
            initial_supply: dec!(250),
            deployed_at: chrono::Utc::now(),
        };

        {
            let store = SledSnapshotStore::open(dir.path()).unwrap();
            let opening = ReserveSnapshot::new(ReserveAmounts::ZERO, Some("0xchain".to_string()));
            store.append_deployment(&deployment, &opening).unwrap();

            let snapshot = ReserveSnapshot::new(
                ReserveAmounts::new(dec!(5), dec!(0), dec!(0)),
                Some("0xchain".to_string()),
            );
            let record = UnityTransactionRecord::completed(
                TransactionKind::Mint,
                dec!(100),
                Some(TokenSymbol::Vet),
                dec!(5),
                "0xmint".to_string(),
                serde_json::Value::Null,
            );
            store.append_ledger_entry(Some(&snapshot), &record).unwrap();
        }

        let store = SledSnapshotStore::open(dir.path()).unwrap();
        assert_eq!(store.latest_deployment(LedgerMode::Chain).unwrap(), Some(deployment));
        assert!(store.latest_deployment(LedgerMode::Mock).unwrap().is_none());
        assert_eq!(store.reserve_history(10).unwrap().len(), 2);
        assert_eq!(store.latest_reserve_snapshot().unwrap().unwrap().vet_amount, dec!(5));
        assert_eq!(store.transactions(10).unwrap()[0].tx_hash, "0xmint");
    }
}
