//! Unity Economics Module
//!
//! Implements the UNITY pricing model:
//! - Price sources and the cached, fallback-protected price feed
//! - Reserve/scarcity/utility weighting of the index basket
//! - The price oracle that computes and records the UNITY price
//! - Burn release pricing and supply tracking

pub mod error;
pub mod feed;
pub mod oracle;
pub mod pricing;
pub mod sources;
pub mod supply;
pub mod weights;

pub use error::{FeedError, PricingError, Result};
pub use feed::{FeedOrigin, FeedPrices, PriceFeed};
pub use oracle::PriceOracle;
pub use pricing::{BurnQuote, PriceCalculator};
pub use sources::{parse_simple_price, CoinGeckoSource, FixedPriceSource, PriceSource};
pub use supply::{SupplyManager, SupplyStats};
pub use weights::WeightEngine;
