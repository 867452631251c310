//! Supply management and tracking

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyStats {
    pub total_minted: Decimal,
    pub total_burned: Decimal,
    pub circulating_supply: Decimal,
}

#[derive(Debug, Clone)]
pub struct SupplyManager {
    stats: SupplyStats,
}

impl SupplyManager {
    pub fn new() -> Self {
        Self::with_initial_supply(Decimal::ZERO)
    }

    /// Supply created at deployment counts as minted
    pub fn with_initial_supply(initial: Decimal) -> Self {
        Self {
            stats: SupplyStats {
                total_minted: initial,
                total_burned: Decimal::ZERO,
                circulating_supply: initial,
            },
        }
    }

    pub fn mint(&mut self, amount: Decimal) {
        self.stats.total_minted = self.stats.total_minted.saturating_add(amount);
        self.stats.circulating_supply = self.stats.circulating_supply.saturating_add(amount);
    }

    /// The ledger only burns what a holder owns, so a burn never exceeds
    /// the circulating supply
    pub fn burn(&mut self, amount: Decimal) {
        debug_assert!(
            amount <= self.stats.circulating_supply,
            "burn of {} exceeds circulating supply {}",
            amount,
            self.stats.circulating_supply
        );
        self.stats.total_burned = self.stats.total_burned.saturating_add(amount);
        self.stats.circulating_supply -= amount;
    }

    pub fn stats(&self) -> &SupplyStats {
        &self.stats
    }

    pub fn net_supply(&self) -> Decimal {
        self.stats.total_minted - self.stats.total_burned
    }
}

impl Default for SupplyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_net_supply_tracks_mints_and_burns() {
        let mut supply = SupplyManager::with_initial_supply(dec!(50));
        supply.mint(dec!(25));
        supply.burn(dec!(75));

        assert_eq!(supply.stats().circulating_supply, dec!(0));
        assert_eq!(supply.net_supply(), dec!(0));
        assert_eq!(supply.stats().total_minted, dec!(75));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds circulating supply")]
    fn test_burn_beyond_circulating_is_not_hidden() {
        let mut supply = SupplyManager::new();
        supply.mint(dec!(10));
        supply.burn(dec!(11));
    }
}
