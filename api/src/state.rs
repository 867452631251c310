//! API State Management
//!
//! Wires the pricing and ledger components from configuration. The ledger
//! mode is chosen here, once, for the lifetime of the state.

use crate::{ApiError, ApiResult};
use std::sync::Arc;
use unity_core::{LedgerMode, UnityConfig};
use unity_economics::{
    CoinGeckoSource, FixedPriceSource, PriceFeed, PriceOracle, PriceSource, WeightEngine,
};
use unity_ledger::{ChainLedger, HttpSettlementClient, LedgerBackend, MockLedger, TokenLedger};
use unity_storage::SnapshotStore;
use unity_treasury::ReserveLedger;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<UnityConfig>,
    pub store: Arc<dyn SnapshotStore>,
    pub reserves: Arc<ReserveLedger>,
    pub oracle: Arc<PriceOracle>,
    pub ledger: Arc<TokenLedger>,
}

impl ApiState {
    /// Build everything on top of `store` with the configured price source
    pub fn from_config(config: UnityConfig, store: Arc<dyn SnapshotStore>) -> ApiResult<Self> {
        let source: Arc<dyn PriceSource> = if config.feed.offline {
            log::info!("📴 Offline mode: using fixed prices");
            Arc::new(FixedPriceSource::default())
        } else {
            Arc::new(
                CoinGeckoSource::new(&config.feed)
                    .map_err(|e| ApiError::Internal(format!("price source: {}", e)))?,
            )
        };
        Self::with_source(config, store, source)
    }

    pub fn with_source(
        config: UnityConfig,
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn PriceSource>,
    ) -> ApiResult<Self> {
        let reserves = Arc::new(ReserveLedger::new(store.clone())?);
        let feed = Arc::new(PriceFeed::from_config(&config.feed, source, store.clone()));
        let oracle = Arc::new(PriceOracle::new(
            feed,
            reserves.clone(),
            store.clone(),
            WeightEngine::from_config(&config.economics),
            config.economics.circulating_supply,
        ));

        let backend = build_backend(&config, store.as_ref())?;
        log::info!("📒 Ledger mode: {}", backend.mode());

        let ledger = Arc::new(
            TokenLedger::new(backend, reserves.clone(), oracle.clone(), store.clone())
                .with_burn_fee_rate(config.economics.burn_fee_rate),
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            reserves,
            oracle,
            ledger,
        })
    }
}

/// Chain mode picks up the contract an earlier run deployed; mock balances
/// live in process memory, so mock mode always starts undeployed
fn build_backend(
    config: &UnityConfig,
    store: &dyn SnapshotStore,
) -> ApiResult<Arc<dyn LedgerBackend>> {
    match config.ledger.mode {
        LedgerMode::Mock => Ok(Arc::new(MockLedger::from_config(&config.ledger))),
        LedgerMode::Chain => {
            let url = config
                .ledger
                .settlement_url
                .as_deref()
                .ok_or(ApiError::WalletNotConfigured)?;
            let client = HttpSettlementClient::new(url, config.feed.request_timeout())?;
            let ledger = ChainLedger::new(client, config.ledger.operator_address.clone())
                .reattach(store)?;
            Ok(Arc::new(ledger))
        }
    }
}
