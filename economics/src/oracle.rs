//! Price Oracle - the UNITY index price
//!
//! `unityPriceUsd = Σ weight[t] × price[t]`, computed from the current
//! reserves, the feed's prices and circulating supply. Every computation
//! is persisted as a price snapshot with its inputs for auditing.

use crate::error::Result;
use crate::feed::PriceFeed;
use crate::weights::WeightEngine;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use unity_core::constants::FALLBACK_SUPPLY;
use unity_core::{CirculatingSupply, PriceResult, PriceSnapshot};
use unity_storage::SnapshotStore;
use unity_treasury::ReserveLedger;

pub struct PriceOracle {
    feed: Arc<PriceFeed>,
    reserves: Arc<ReserveLedger>,
    store: Arc<dyn SnapshotStore>,
    engine: WeightEngine,
    default_supply: CirculatingSupply,
}

impl PriceOracle {
    pub fn new(
        feed: Arc<PriceFeed>,
        reserves: Arc<ReserveLedger>,
        store: Arc<dyn SnapshotStore>,
        engine: WeightEngine,
        default_supply: CirculatingSupply,
    ) -> Self {
        Self {
            feed,
            reserves,
            store,
            engine,
            default_supply,
        }
    }

    /// Recompute the price and append a snapshot.
    ///
    /// Supply entries that are zero or negative are replaced by the
    /// fallback supply before weighting.
    pub async fn calculate_price(
        &self,
        circulating_supply: Option<CirculatingSupply>,
    ) -> Result<PriceResult> {
        let supply = circulating_supply.unwrap_or(self.default_supply);
        let supply = CirculatingSupply::from_fn(|token| {
            let value = supply.get(token);
            if value > Decimal::ZERO {
                value
            } else {
                FALLBACK_SUPPLY
            }
        });

        let reserves = self.reserves.current().amounts();
        let feed = self.feed.fetch_prices().await?;
        let weights = self.engine.compute_weights(&reserves, &feed.prices, &supply);

        let unity_price_usd: Decimal = weights
            .iter()
            .map(|(token, weight)| weight * feed.prices.get(token))
            .sum();

        let snapshot = PriceSnapshot::new(
            unity_price_usd,
            feed.prices,
            weights,
            self.feed.source_name(),
            json!({
                "reserves": reserves,
                "circulatingSupply": supply,
                "feedOrigin": feed.origin,
            }),
        );
        self.store.append_price_snapshot(&snapshot)?;

        log::info!(
            "📈 UNITY price {} USD (weights VET {} / VTHO {} / B3TR {}, prices from {})",
            snapshot.unity_price_usd,
            snapshot.vet_weight,
            snapshot.vtho_weight,
            snapshot.b3tr_weight,
            feed.origin
        );

        Ok(PriceResult::from(&snapshot))
    }

    /// Most recent stored price, computing one if none exists yet
    pub async fn latest_price(&self) -> Result<PriceResult> {
        match self.store.latest_price_snapshot()? {
            Some(snapshot) => Ok(PriceResult::from(&snapshot)),
            None => {
                log::info!("No stored UNITY price yet, calculating one");
                self.calculate_price(None).await
            }
        }
    }

    /// Newest first
    pub fn history(&self, limit: usize) -> Result<Vec<PriceSnapshot>> {
        Ok(self.store.price_history(limit)?)
    }
}
