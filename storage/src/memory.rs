//! In-process snapshot store for tests and offline runs

use crate::{Result, SnapshotStore};
use parking_lot::RwLock;
use unity_core::{Deployment, LedgerMode, PriceSnapshot, ReserveSnapshot, UnityTransactionRecord};

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    prices: RwLock<Vec<PriceSnapshot>>,
    reserves: RwLock<Vec<ReserveSnapshot>>,
    transactions: RwLock<Vec<UnityTransactionRecord>>,
    deployments: RwLock<Vec<Deployment>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price_count(&self) -> usize {
        self.prices.read().len()
    }

    pub fn reserve_count(&self) -> usize {
        self.reserves.read().len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.read().len()
    }
}

fn newest_first<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    items.iter().rev().take(limit).cloned().collect()
}

impl SnapshotStore for MemorySnapshotStore {
    fn append_price_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        self.prices.write().push(snapshot.clone());
        Ok(())
    }

    fn latest_price_snapshot(&self) -> Result<Option<PriceSnapshot>> {
        Ok(self.prices.read().last().cloned())
    }

    fn price_history(&self, limit: usize) -> Result<Vec<PriceSnapshot>> {
        Ok(newest_first(&self.prices.read(), limit))
    }

    fn append_reserve_snapshot(&self, snapshot: &ReserveSnapshot) -> Result<()> {
        self.reserves.write().push(snapshot.clone());
        Ok(())
    }

    fn latest_reserve_snapshot(&self) -> Result<Option<ReserveSnapshot>> {
        Ok(self.reserves.read().last().cloned())
    }

    fn reserve_history(&self, limit: usize) -> Result<Vec<ReserveSnapshot>> {
        Ok(newest_first(&self.reserves.read(), limit))
    }

    fn append_transaction(&self, record: &UnityTransactionRecord) -> Result<()> {
        self.transactions.write().push(record.clone());
        Ok(())
    }

    fn transactions(&self, limit: usize) -> Result<Vec<UnityTransactionRecord>> {
        Ok(newest_first(&self.transactions.read(), limit))
    }

    fn append_ledger_entry(
        &self,
        reserve: Option<&ReserveSnapshot>,
        record: &UnityTransactionRecord,
    ) -> Result<()> {
        let mut reserves = self.reserves.write();
        let mut transactions = self.transactions.write();
        if let Some(snapshot) = reserve {
            reserves.push(snapshot.clone());
        }
        transactions.push(record.clone());
        Ok(())
    }

    fn append_deployment(&self, deployment: &Deployment, reserve: &ReserveSnapshot) -> Result<()> {
        let mut deployments = self.deployments.write();
        let mut reserves = self.reserves.write();
        deployments.push(deployment.clone());
        reserves.push(reserve.clone());
        Ok(())
    }

    fn latest_deployment(&self, mode: LedgerMode) -> Result<Option<Deployment>> {
        Ok(self
            .deployments
            .read()
            .iter()
            .rev()
            .find(|d| d.mode == mode)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use unity_core::ReserveAmounts;

    #[test]
    fn test_latest_reserve_is_last_appended() {
        let store = MemorySnapshotStore::new();
        assert!(store.latest_reserve_snapshot().unwrap().is_none());

        for vet in [dec!(1), dec!(2), dec!(3)] {
            let snapshot =
                ReserveSnapshot::new(ReserveAmounts::new(vet, dec!(0), dec!(0)), None);
            store.append_reserve_snapshot(&snapshot).unwrap();
        }

        let latest = store.latest_reserve_snapshot().unwrap().unwrap();
        assert_eq!(latest.vet_amount, dec!(3));
        assert_eq!(store.reserve_count(), 3);

        let history = store.reserve_history(2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].vet_amount, dec!(3));
        assert_eq!(history[1].vet_amount, dec!(2));
    }

    #[test]
    fn test_latest_deployment_per_mode() {
        let store = MemorySnapshotStore::new();
        assert!(store.latest_deployment(LedgerMode::Chain).unwrap().is_none());

        let deployment = Deployment {
            address: "0xchain".to_string(),
            name: "Unity".to_string(),
            symbol: "UNITY".to_string(),
            mode: LedgerMode::Chain,
            initial_supply: dec!(0),
            deployed_at: chrono::Utc::now(),
        };
        let reserve = ReserveSnapshot::new(ReserveAmounts::ZERO, Some("0xchain".to_string()));
        store.append_deployment(&deployment, &reserve).unwrap();

        assert_eq!(store.latest_deployment(LedgerMode::Chain).unwrap(), Some(deployment));
        assert!(store.latest_deployment(LedgerMode::Mock).unwrap().is_none());
        assert_eq!(store.reserve_count(), 1);
    }
}
