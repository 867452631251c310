//! Price sources: the CoinGecko simple-price API and a fixed table

use crate::error::FeedError;
use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use unity_core::config::FeedTokenIds;
use unity_core::{round_persisted, FeedConfig, TokenPrices, TokenSymbol};

/// Anything that can quote current USD prices for the three tokens
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Identifier stored with every price snapshot
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<TokenPrices, FeedError>;
}

pub struct CoinGeckoSource {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    token_ids: FeedTokenIds,
}

impl CoinGeckoSource {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token_ids: config.token_ids.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<TokenPrices, FeedError> {
        let ids = TokenSymbol::ALL
            .iter()
            .map(|t| self.token_ids.get(*t))
            .collect::<Vec<_>>()
            .join(",");

        let mut request = self
            .client
            .get(format!("{}/simple/price", self.api_url))
            .query(&[("ids", ids.as_str()), ("vs_currencies", "usd")]);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }

        let body: serde_json::Value = request.send().await?.error_for_status()?.json().await?;
        parse_simple_price(&body, &self.token_ids)
    }
}

/// Parse a `/simple/price` body: `{"<id>": {"usd": <number>}, ...}`.
///
/// A token missing from the body is quoted at zero, which removes it from
/// the index. Negative or non-finite prices reject the whole response.
pub fn parse_simple_price(
    body: &serde_json::Value,
    token_ids: &FeedTokenIds,
) -> Result<TokenPrices, FeedError> {
    if !body.is_object() {
        return Err(FeedError::Malformed(format!("expected object, got {}", body)));
    }

    let mut prices = TokenPrices::ZERO;
    for token in TokenSymbol::ALL {
        let Some(raw) = body.get(token_ids.get(token)).and_then(|entry| entry.get("usd")) else {
            log::warn!("⚠️  No USD quote for {} in price response", token);
            continue;
        };

        let value = raw
            .as_f64()
            .and_then(Decimal::from_f64)
            .map(round_persisted)
            .ok_or_else(|| FeedError::InvalidPrice {
                token,
                value: raw.to_string(),
            })?;
        if value < Decimal::ZERO {
            return Err(FeedError::InvalidPrice {
                token,
                value: value.to_string(),
            });
        }
        prices.set(token, value);
    }

    Ok(prices)
}

/// Serves one fixed price table; used offline and in tests
#[derive(Debug, Clone)]
pub struct FixedPriceSource {
    prices: TokenPrices,
}

impl FixedPriceSource {
    pub fn new(prices: TokenPrices) -> Self {
        Self { prices }
    }
}

impl Default for FixedPriceSource {
    fn default() -> Self {
        Self::new(unity_core::constants::default_prices())
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self) -> Result<TokenPrices, FeedError> {
        Ok(self.prices)
    }
}
