//! Reserve Ledger
//!
//! Owns creation of reserve snapshots. The newest committed snapshot is
//! kept in memory so `current()` never touches storage or waits on a
//! writer; appends are serialized so snapshots form one ordered sequence.
//!
//! `plan_*` computes the next snapshot without storing it. A caller that
//! persists the snapshot itself (together with other records) makes it
//! current with `publish`, and must serialize plan and publish.

use crate::error::{ReserveError, Result};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::sync::Arc;
use unity_core::{ReserveAmounts, ReserveSnapshot, TokenSymbol};
use unity_storage::SnapshotStore;

/// Outcome of taking tokens out of the reserve
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveRelease {
    pub snapshot: ReserveSnapshot,
    /// Quantity the caller asked to release
    pub requested: Decimal,
    /// Quantity actually removed from the reserve
    pub withdrawn: Decimal,
    /// True when the request exceeded the reserve and it was floored at zero
    pub clamped: bool,
}

pub struct ReserveLedger {
    store: Arc<dyn SnapshotStore>,
    current: RwLock<Option<ReserveSnapshot>>,
    write_lock: Mutex<()>,
}

impl ReserveLedger {
    /// Open the ledger on top of a store, picking up its latest snapshot
    pub fn new(store: Arc<dyn SnapshotStore>) -> Result<Self> {
        let latest = store.latest_reserve_snapshot()?;
        if let Some(snapshot) = &latest {
            log::debug!(
                "Loaded reserve snapshot: VET {} / VTHO {} / B3TR {}",
                snapshot.vet_amount,
                snapshot.vtho_amount,
                snapshot.b3tr_amount
            );
        }

        Ok(Self {
            store,
            current: RwLock::new(latest),
            write_lock: Mutex::new(()),
        })
    }

    /// Latest committed reserves, or zero reserves if none were recorded
    pub fn current(&self) -> ReserveSnapshot {
        self.current
            .read()
            .clone()
            .unwrap_or_else(ReserveSnapshot::empty)
    }

    pub fn has_snapshot(&self) -> bool {
        self.current.read().is_some()
    }

    /// Snapshot with explicit quantities, not yet stored
    pub fn plan_snapshot(
        &self,
        amounts: ReserveAmounts,
        contract_address: Option<String>,
    ) -> Result<ReserveSnapshot> {
        if let Some((_, negative)) = amounts.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(ReserveError::InvalidAmount(negative));
        }
        Ok(self.snapshot_of(amounts, contract_address))
    }

    /// Snapshot after depositing `amount` of `token`, not yet stored
    pub fn plan_deposit(
        &self,
        token: TokenSymbol,
        amount: Decimal,
        contract_address: Option<String>,
    ) -> Result<ReserveSnapshot> {
        if amount < Decimal::ZERO {
            return Err(ReserveError::InvalidAmount(amount));
        }

        let mut amounts = self.current().amounts();
        let held = amounts.get(token);
        let total = held
            .checked_add(amount)
            .ok_or(ReserveError::Overflow { token, held, amount })?;
        amounts.set(token, total);
        Ok(self.snapshot_of(amounts, contract_address))
    }

    /// Snapshot after releasing `amount` of `token`, not yet stored.
    ///
    /// A release larger than the reserve floors the reserve at zero rather
    /// than failing; the shortfall is reported through `clamped`.
    pub fn plan_release(
        &self,
        token: TokenSymbol,
        amount: Decimal,
        contract_address: Option<String>,
    ) -> Result<ReserveRelease> {
        if amount < Decimal::ZERO {
            return Err(ReserveError::InvalidAmount(amount));
        }

        let mut amounts = self.current().amounts();
        let held = amounts.get(token);
        let (remaining, clamped) = if amount > held {
            (Decimal::ZERO, true)
        } else {
            (held - amount, false)
        };
        amounts.set(token, remaining);

        Ok(ReserveRelease {
            snapshot: self.snapshot_of(amounts, contract_address),
            requested: amount,
            withdrawn: held - remaining,
            clamped,
        })
    }

    /// Make a snapshot the caller has already persisted current
    pub fn publish(&self, snapshot: &ReserveSnapshot) {
        let _guard = self.write_lock.lock();
        *self.current.write() = Some(snapshot.clone());
    }

    /// Append a snapshot with explicit quantities
    pub fn record_snapshot(
        &self,
        vet: Decimal,
        vtho: Decimal,
        b3tr: Decimal,
        contract_address: Option<String>,
    ) -> Result<ReserveSnapshot> {
        let _guard = self.write_lock.lock();
        let snapshot =
            self.plan_snapshot(ReserveAmounts::new(vet, vtho, b3tr), contract_address)?;
        self.commit(snapshot)
    }

    /// Add a deposit to the reserve of `token`
    pub fn deposit(
        &self,
        token: TokenSymbol,
        amount: Decimal,
        contract_address: Option<String>,
    ) -> Result<ReserveSnapshot> {
        let _guard = self.write_lock.lock();
        let snapshot = self.plan_deposit(token, amount, contract_address)?;

        log::info!("🏦 Reserve deposit: {} {}", amount, token);
        self.commit(snapshot)
    }

    /// Remove `amount` of `token` from the reserve, clamping at zero
    pub fn release(
        &self,
        token: TokenSymbol,
        amount: Decimal,
        contract_address: Option<String>,
    ) -> Result<ReserveRelease> {
        let _guard = self.write_lock.lock();
        let release = self.plan_release(token, amount, contract_address)?;

        if release.clamped {
            log::warn!(
                "⚠️  Release of {} {} exceeds reserve of {}, clamping to zero",
                amount,
                token,
                release.withdrawn
            );
        } else {
            log::info!("🏦 Reserve release: {} {}", amount, token);
        }

        self.commit(release.snapshot.clone())?;
        Ok(release)
    }

    /// Newest first
    pub fn history(&self, limit: usize) -> Result<Vec<ReserveSnapshot>> {
        Ok(self.store.reserve_history(limit)?)
    }

    fn snapshot_of(
        &self,
        amounts: ReserveAmounts,
        contract_address: Option<String>,
    ) -> ReserveSnapshot {
        let contract_address =
            contract_address.or_else(|| self.current().contract_address.clone());
        ReserveSnapshot::new(amounts, contract_address)
    }

    // Caller holds `write_lock`.
    fn commit(&self, snapshot: ReserveSnapshot) -> Result<ReserveSnapshot> {
        self.store.append_reserve_snapshot(&snapshot)?;
        *self.current.write() = Some(snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use unity_storage::MemorySnapshotStore;

    fn ledger() -> (Arc<MemorySnapshotStore>, ReserveLedger) {
        let store = Arc::new(MemorySnapshotStore::new());
        let ledger = ReserveLedger::new(store.clone()).unwrap();
        (store, ledger)
    }

    #[test]
    fn test_current_defaults_to_zero() {
        let (_, ledger) = ledger();
        let current = ledger.current();
        assert_eq!(current.amounts(), ReserveAmounts::ZERO);
        assert!(current.contract_address.is_none());
        assert!(!ledger.has_snapshot());
    }

    #[test]
    fn test_record_snapshot_rejects_negative() {
        let (store, ledger) = ledger();
        let result = ledger.record_snapshot(dec!(1), dec!(-0.5), dec!(0), None);
        assert!(matches!(result, Err(ReserveError::InvalidAmount(_))));
        assert_eq!(store.reserve_count(), 0);
    }

    #[test]
    fn test_deposit_accumulates_and_keeps_contract() {
        let (store, ledger) = ledger();
        ledger
            .record_snapshot(dec!(0), dec!(0), dec!(0), Some("0xunity".to_string()))
            .unwrap();
        ledger.deposit(TokenSymbol::Vet, dec!(5), None).unwrap();
        let snapshot = ledger.deposit(TokenSymbol::Vet, dec!(2.5), None).unwrap();

        assert_eq!(snapshot.vet_amount, dec!(7.5));
        assert_eq!(snapshot.contract_address.as_deref(), Some("0xunity"));
        assert_eq!(store.reserve_count(), 3);
    }

    #[test]
    fn test_release_within_reserve() {
        let (_, ledger) = ledger();
        ledger.deposit(TokenSymbol::Vtho, dec!(100), None).unwrap();

        let release = ledger.release(TokenSymbol::Vtho, dec!(40), None).unwrap();
        assert!(!release.clamped);
        assert_eq!(release.withdrawn, dec!(40));
        assert_eq!(release.snapshot.vtho_amount, dec!(60));
    }

    #[test]
    fn test_release_clamps_at_zero() {
        let (_, ledger) = ledger();
        ledger.deposit(TokenSymbol::B3tr, dec!(3), None).unwrap();

        let release = ledger.release(TokenSymbol::B3tr, dec!(10), None).unwrap();
        assert!(release.clamped);
        assert_eq!(release.requested, dec!(10));
        assert_eq!(release.withdrawn, dec!(3));
        assert_eq!(release.snapshot.b3tr_amount, dec!(0));
        assert_eq!(ledger.current().b3tr_amount, dec!(0));
    }

    #[test]
    fn test_deposit_overflow_leaves_reserve_unchanged() {
        let (store, ledger) = ledger();
        ledger.deposit(TokenSymbol::Vet, Decimal::MAX, None).unwrap();

        let result = ledger.deposit(TokenSymbol::Vet, dec!(1), None);
        assert!(matches!(
            result,
            Err(ReserveError::Overflow { token: TokenSymbol::Vet, .. })
        ));
        assert_eq!(ledger.current().vet_amount, Decimal::MAX);
        assert_eq!(store.reserve_count(), 1);
    }

    #[test]
    fn test_plan_is_invisible_until_published() {
        let (store, ledger) = ledger();
        ledger.deposit(TokenSymbol::Vtho, dec!(100), None).unwrap();

        let release = ledger.plan_release(TokenSymbol::Vtho, dec!(30), None).unwrap();
        assert_eq!(release.snapshot.vtho_amount, dec!(70));
        assert_eq!(ledger.current().vtho_amount, dec!(100));
        assert_eq!(store.reserve_count(), 1);

        ledger.publish(&release.snapshot);
        assert_eq!(ledger.current().vtho_amount, dec!(70));
    }

    #[test]
    fn test_reopen_picks_up_latest() {
        let store = Arc::new(MemorySnapshotStore::new());
        {
            let ledger = ReserveLedger::new(store.clone()).unwrap();
            ledger.deposit(TokenSymbol::Vet, dec!(9), None).unwrap();
        }

        let ledger = ReserveLedger::new(store).unwrap();
        assert_eq!(ledger.current().vet_amount, dec!(9));
    }
}
