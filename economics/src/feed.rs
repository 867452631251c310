//! Price Feed - cached, time-bounded price fetching with fallbacks
//!
//! Fallback chain, each tier an independent failure boundary:
//! 1. fresh cache (younger than the TTL), no network call
//! 2. live fetch from the price source, bounded by a timeout
//! 3. stale cache
//! 4. prices of the most recent stored price snapshot
//! 5. built-in default prices

use crate::error::{FeedError, PricingError, Result};
use crate::sources::PriceSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use unity_core::{FeedConfig, TokenPrices};
use unity_storage::SnapshotStore;

/// Which tier of the fallback chain produced a price set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrigin {
    Live,
    Cache,
    StaleCache,
    Snapshot,
    Default,
}

impl fmt::Display for FeedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedOrigin::Live => "live",
            FeedOrigin::Cache => "cache",
            FeedOrigin::StaleCache => "stale_cache",
            FeedOrigin::Snapshot => "snapshot",
            FeedOrigin::Default => "default",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedPrices {
    pub prices: TokenPrices,
    pub origin: FeedOrigin,
}

#[derive(Debug, Clone, Copy)]
struct CachedPrices {
    prices: TokenPrices,
    fetched_at: Instant,
}

pub struct PriceFeed {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn SnapshotStore>,
    cache_ttl: Duration,
    request_timeout: Duration,
    default_prices: Option<TokenPrices>,
    cache: RwLock<Option<CachedPrices>>,
    // Serializes refreshes so an expired cache triggers one fetch
    refresh: Mutex<()>,
}

impl PriceFeed {
    pub fn new(source: Arc<dyn PriceSource>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            source,
            store,
            cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            default_prices: Some(unity_core::constants::default_prices()),
            cache: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn from_config(
        config: &FeedConfig,
        source: Arc<dyn PriceSource>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let feed = Self::new(source, store)
            .with_cache_ttl(config.cache_ttl())
            .with_request_timeout(config.request_timeout());
        if config.use_default_prices {
            feed
        } else {
            feed.without_default_prices()
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disable the last-resort tier; total failure then surfaces as
    /// `FeedUnavailable` instead of an invented price
    pub fn without_default_prices(mut self) -> Self {
        self.default_prices = None;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Current prices, walking the fallback chain as needed
    pub async fn fetch_prices(&self) -> Result<FeedPrices> {
        if let Some(prices) = self.fresh_cached().await {
            return Ok(FeedPrices {
                prices,
                origin: FeedOrigin::Cache,
            });
        }

        let _refresh = self.refresh.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(prices) = self.fresh_cached().await {
            return Ok(FeedPrices {
                prices,
                origin: FeedOrigin::Cache,
            });
        }

        let error = match self.fetch_live().await {
            Ok(prices) => {
                *self.cache.write().await = Some(CachedPrices {
                    prices,
                    fetched_at: Instant::now(),
                });
                return Ok(FeedPrices {
                    prices,
                    origin: FeedOrigin::Live,
                });
            }
            Err(e) => e,
        };
        log::error!("❌ Error fetching {} prices: {}", self.source.name(), error);

        if let Some(cached) = *self.cache.read().await {
            log::warn!("⚠️  Using stale cached prices as fallback");
            return Ok(FeedPrices {
                prices: cached.prices,
                origin: FeedOrigin::StaleCache,
            });
        }

        match self.store.latest_price_snapshot() {
            Ok(Some(snapshot)) => {
                log::warn!("⚠️  Using latest stored prices as fallback");
                return Ok(FeedPrices {
                    prices: snapshot.prices(),
                    origin: FeedOrigin::Snapshot,
                });
            }
            Ok(None) => {}
            Err(e) => log::error!("❌ Could not read stored prices: {}", e),
        }

        match self.default_prices {
            Some(prices) => {
                log::warn!("⚠️  Using default prices as last resort");
                Ok(FeedPrices {
                    prices,
                    origin: FeedOrigin::Default,
                })
            }
            None => Err(PricingError::FeedUnavailable(error.to_string())),
        }
    }

    async fn fresh_cached(&self) -> Option<TokenPrices> {
        let cache = self.cache.read().await;
        (*cache)
            .filter(|c| c.fetched_at.elapsed() < self.cache_ttl)
            .map(|c| c.prices)
    }

    async fn fetch_live(&self) -> std::result::Result<TokenPrices, FeedError> {
        let prices = tokio::time::timeout(self.request_timeout, self.source.fetch())
            .await
            .map_err(|_| FeedError::Timeout(self.request_timeout))??;

        if !prices.is_non_negative() {
            return Err(FeedError::Malformed(format!(
                "negative price in {:?}",
                prices
            )));
        }
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FixedPriceSource;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use unity_core::{PriceSnapshot, TokenWeights};
    use unity_storage::MemorySnapshotStore;

    struct SlowSource;

    #[async_trait]
    impl PriceSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self) -> std::result::Result<TokenPrices, FeedError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(TokenPrices::new(dec!(1), dec!(1), dec!(1)))
        }
    }

    #[tokio::test]
    async fn test_live_then_cached() {
        let store = Arc::new(MemorySnapshotStore::new());
        let feed = PriceFeed::new(Arc::new(FixedPriceSource::default()), store);

        let first = feed.fetch_prices().await.unwrap();
        assert_eq!(first.origin, FeedOrigin::Live);

        let second = feed.fetch_prices().await.unwrap();
        assert_eq!(second.origin, FeedOrigin::Cache);
        assert_eq!(first.prices, second.prices);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out_to_snapshot() {
        let store = Arc::new(MemorySnapshotStore::new());
        store
            .append_price_snapshot(&PriceSnapshot::new(
                dec!(0.04),
                TokenPrices::new(dec!(0.04), dec!(0.003), dec!(0.06)),
                TokenWeights::new(dec!(1), dec!(0), dec!(0)),
                "coingecko",
                serde_json::Value::Null,
            ))
            .unwrap();

        let feed = PriceFeed::new(Arc::new(SlowSource), store);
        let result = feed.fetch_prices().await.unwrap();
        assert_eq!(result.origin, FeedOrigin::Snapshot);
        assert_eq!(result.prices.vtho, dec!(0.003));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_prices_last_resort() {
        let store = Arc::new(MemorySnapshotStore::new());
        let feed = PriceFeed::new(Arc::new(SlowSource), store);

        let result = feed.fetch_prices().await.unwrap();
        assert_eq!(result.origin, FeedOrigin::Default);
        assert_eq!(result.prices, unity_core::constants::default_prices());
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_unavailable_without_defaults() {
        let store = Arc::new(MemorySnapshotStore::new());
        let feed = PriceFeed::new(Arc::new(SlowSource), store).without_default_prices();

        let result = feed.fetch_prices().await;
        assert!(matches!(result, Err(PricingError::FeedUnavailable(_))));
    }
}
