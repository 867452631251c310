//! Unity Storage Layer - Append-Only Snapshot Store
//!
//! Durable home of every price snapshot, reserve snapshot and ledger
//! transaction record. Records are appended and read back, never updated
//! or deleted. "Latest" always means the most recently appended record.
//!
//! A ledger operation writes its reserve snapshot and transaction record
//! through one call so either both land or neither does.

pub mod memory;
pub mod sled_store;

pub use memory::MemorySnapshotStore;
pub use sled_store::SledSnapshotStore;

use thiserror::Error;
use unity_core::{Deployment, LedgerMode, PriceSnapshot, ReserveSnapshot, UnityTransactionRecord};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Transaction aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Append-only storage for snapshots and transaction records
pub trait SnapshotStore: Send + Sync {
    fn append_price_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()>;

    fn latest_price_snapshot(&self) -> Result<Option<PriceSnapshot>>;

    /// Newest first, at most `limit` entries
    fn price_history(&self, limit: usize) -> Result<Vec<PriceSnapshot>>;

    fn append_reserve_snapshot(&self, snapshot: &ReserveSnapshot) -> Result<()>;

    fn latest_reserve_snapshot(&self) -> Result<Option<ReserveSnapshot>>;

    /// Newest first, at most `limit` entries
    fn reserve_history(&self, limit: usize) -> Result<Vec<ReserveSnapshot>>;

    fn append_transaction(&self, record: &UnityTransactionRecord) -> Result<()>;

    /// Newest first, at most `limit` entries
    fn transactions(&self, limit: usize) -> Result<Vec<UnityTransactionRecord>>;

    /// Append a transaction record and, when given, the reserve snapshot
    /// it produced. Both are written or neither is.
    fn append_ledger_entry(
        &self,
        reserve: Option<&ReserveSnapshot>,
        record: &UnityTransactionRecord,
    ) -> Result<()>;

    /// Append a deployment together with its opening reserve snapshot
    fn append_deployment(&self, deployment: &Deployment, reserve: &ReserveSnapshot) -> Result<()>;

    /// Most recent deployment made in `mode`
    fn latest_deployment(&self, mode: LedgerMode) -> Result<Option<Deployment>>;
}
