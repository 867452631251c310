//! Weight Engine - reserve/scarcity/utility weighting of the index
//!
//! Per token: `raw = scarcity × utility × reserve × price`, where
//! `scarcity = 1 / log10(max(supply, 10))`. Weights are the raw values
//! normalized to sum to one. An all-zero basket yields all-zero weights.

use rust_decimal::{Decimal, MathematicalOps};
use unity_core::constants::{FALLBACK_SUPPLY, PLATFORM_UTILITY_WEIGHT};
use unity_core::{
    CirculatingSupply, EconomicsConfig, ReserveAmounts, TokenPrices, TokenSymbol, TokenWeights,
};

const MIN_SCARCITY_SUPPLY: Decimal = Decimal::TEN;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightEngine {
    platform_token: TokenSymbol,
    platform_utility: Decimal,
}

impl Default for WeightEngine {
    fn default() -> Self {
        Self::new(TokenSymbol::B3tr, PLATFORM_UTILITY_WEIGHT)
    }
}

impl WeightEngine {
    pub fn new(platform_token: TokenSymbol, platform_utility: Decimal) -> Self {
        Self {
            platform_token,
            platform_utility,
        }
    }

    pub fn from_config(config: &EconomicsConfig) -> Self {
        Self::new(config.platform_token, config.platform_utility_weight)
    }

    /// Inverse log of circulating supply; unknown or non-positive supply
    /// counts as the fallback supply
    pub fn scarcity_factor(supply: Decimal) -> Decimal {
        let supply = if supply > Decimal::ZERO {
            supply
        } else {
            FALLBACK_SUPPLY
        };
        Decimal::ONE / supply.max(MIN_SCARCITY_SUPPLY).log10()
    }

    pub fn utility_weight(&self, token: TokenSymbol) -> Decimal {
        if token == self.platform_token {
            self.platform_utility
        } else {
            Decimal::ONE
        }
    }

    pub fn raw_weights(
        &self,
        reserves: &ReserveAmounts,
        prices: &TokenPrices,
        supply: &CirculatingSupply,
    ) -> TokenWeights {
        TokenWeights::from_fn(|token| {
            let reserve_value_usd =
                reserves.get(token).max(Decimal::ZERO) * prices.get(token).max(Decimal::ZERO);
            Self::scarcity_factor(supply.get(token)) * self.utility_weight(token) * reserve_value_usd
        })
    }

    pub fn compute_weights(
        &self,
        reserves: &ReserveAmounts,
        prices: &TokenPrices,
        supply: &CirculatingSupply,
    ) -> TokenWeights {
        let raw = self.raw_weights(reserves, prices, supply);
        let total = raw.sum();
        let denominator = if total.is_zero() { Decimal::ONE } else { total };

        TokenWeights::from_fn(|token| raw.get(token) / denominator)
    }
}
