//! Unity configuration (unity.toml) support
//!
//! Every field has a default so an empty file, or no file at all, yields a
//! working mock-mode setup. Environment variables override the file:
//!
//! - `COINGECKO_API_KEY`      feed API key
//! - `UNITY_DEPLOY_MODE`      `mock` or `chain`
//! - `VECHAIN_RPC`            settlement endpoint for chain mode
//! - `UNITY_OPERATOR_ADDRESS` operator (reserve) wallet address
//! - `UNITY_DATA_DIR`         snapshot store directory

use crate::token::{CirculatingSupply, TokenSymbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Which ledger backend serves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    #[default]
    Mock,
    Chain,
}

impl fmt::Display for LedgerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerMode::Mock => write!(f, "mock"),
            LedgerMode::Chain => write!(f, "chain"),
        }
    }
}

impl FromStr for LedgerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(LedgerMode::Mock),
            // "real" is what older deployments put in UNITY_DEPLOY_MODE
            "chain" | "real" => Ok(LedgerMode::Chain),
            other => Err(ConfigError::InvalidValue {
                field: "ledger.mode",
                message: format!("expected 'mock' or 'chain', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Serve the built-in default prices instead of calling the API
    #[serde(default)]
    pub offline: bool,

    /// Fall back to built-in prices when every other source failed
    #[serde(default = "default_use_default_prices")]
    pub use_default_prices: bool,

    #[serde(default = "default_token_ids")]
    pub token_ids: FeedTokenIds,
}

/// External price API identifiers of the three tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedTokenIds {
    pub vet: String,
    pub vtho: String,
    pub b3tr: String,
}

impl FeedTokenIds {
    pub fn get(&self, token: TokenSymbol) -> &str {
        match token {
            TokenSymbol::Vet => &self.vet,
            TokenSymbol::Vtho => &self.vtho,
            TokenSymbol::B3tr => &self.b3tr,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    #[serde(default)]
    pub mode: LedgerMode,

    #[serde(default)]
    pub settlement_url: Option<String>,

    #[serde(default)]
    pub operator_address: Option<String>,

    #[serde(default = "default_token_name")]
    pub token_name: String,

    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,

    #[serde(default)]
    pub initial_supply: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomicsConfig {
    #[serde(default = "default_burn_fee_rate")]
    pub burn_fee_rate: Decimal,

    #[serde(default = "default_platform_token")]
    pub platform_token: TokenSymbol,

    #[serde(default = "default_platform_utility_weight")]
    pub platform_utility_weight: Decimal,

    #[serde(default = "default_circulating_supply")]
    pub circulating_supply: CirculatingSupply,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnityConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub economics: EconomicsConfig,
}

fn default_api_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_use_default_prices() -> bool {
    true
}

fn default_token_ids() -> FeedTokenIds {
    FeedTokenIds {
        vet: "vechain".to_string(),
        vtho: "vethor-token".to_string(),
        b3tr: "vechain-vet".to_string(),
    }
}

fn default_token_name() -> String {
    "Unity".to_string()
}

fn default_token_symbol() -> String {
    "UNITY".to_string()
}

fn default_burn_fee_rate() -> Decimal {
    crate::constants::BURN_FEE_RATE
}

fn default_platform_token() -> TokenSymbol {
    TokenSymbol::B3tr
}

fn default_platform_utility_weight() -> Decimal {
    crate::constants::PLATFORM_UTILITY_WEIGHT
}

fn default_circulating_supply() -> CirculatingSupply {
    crate::constants::default_circulating_supply()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            api_url: default_api_url(),
            api_key: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            offline: false,
            use_default_prices: default_use_default_prices(),
            token_ids: default_token_ids(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            mode: LedgerMode::Mock,
            settlement_url: None,
            operator_address: None,
            token_name: default_token_name(),
            token_symbol: default_token_symbol(),
            initial_supply: Decimal::ZERO,
        }
    }
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        EconomicsConfig {
            burn_fee_rate: default_burn_fee_rate(),
            platform_token: default_platform_token(),
            platform_utility_weight: default_platform_utility_weight(),
            circulating_supply: default_circulating_supply(),
        }
    }
}

impl Default for UnityConfig {
    fn default() -> Self {
        UnityConfig {
            data_dir: default_data_dir(),
            feed: FeedConfig::default(),
            ledger: LedgerConfig::default(),
            economics: EconomicsConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl UnityConfig {
    /// Load from a TOML file, apply environment overrides and validate
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse(&contents)?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the process env in production)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = lookup("COINGECKO_API_KEY").filter(|k| !k.is_empty()) {
            self.feed.api_key = Some(key);
        }
        if let Some(mode) = lookup("UNITY_DEPLOY_MODE") {
            self.ledger.mode = mode.parse()?;
        }
        if let Some(url) = lookup("VECHAIN_RPC").filter(|u| !u.is_empty()) {
            self.ledger.settlement_url = Some(url);
        }
        if let Some(address) = lookup("UNITY_OPERATOR_ADDRESS").filter(|a| !a.is_empty()) {
            self.ledger.operator_address = Some(address);
        }
        if let Some(dir) = lookup("UNITY_DATA_DIR").filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.cache_ttl_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.feed.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }

        let fee = self.economics.burn_fee_rate;
        if fee < Decimal::ZERO || fee >= Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "economics.burn_fee_rate",
                message: format!("must be in [0, 1), got {}", fee),
            });
        }
        if self.economics.platform_utility_weight <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "economics.platform_utility_weight",
                message: "must be positive".to_string(),
            });
        }
        if self.ledger.mode == LedgerMode::Chain && self.ledger.settlement_url.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "ledger.settlement_url",
                message: "required in chain mode".to_string(),
            });
        }
        if self.ledger.initial_supply < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "ledger.initial_supply",
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = UnityConfig::parse("").unwrap();
        assert_eq!(config, UnityConfig::default());
        assert_eq!(config.ledger.mode, LedgerMode::Mock);
        assert_eq!(config.feed.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.feed.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.economics.burn_fee_rate, dec!(0.005));
        assert_eq!(config.economics.platform_token, TokenSymbol::B3tr);
    }

    #[test]
    fn test_parse_sections() {
        let config = UnityConfig::parse(
            r#"
            data_dir = "/var/lib/unity"

            [feed]
            cache_ttl_secs = 30
            offline = true

            [ledger]
            mode = "chain"
            operator_address = "0xoperator"

            [economics]
            burn_fee_rate = "0.01"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/unity"));
        assert_eq!(config.feed.cache_ttl_secs, 30);
        assert!(config.feed.offline);
        assert_eq!(config.ledger.mode, LedgerMode::Chain);
        assert_eq!(config.ledger.operator_address.as_deref(), Some("0xoperator"));
        assert_eq!(config.economics.burn_fee_rate, dec!(0.01));
        assert_eq!(config.economics.platform_utility_weight, dec!(1.2));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("UNITY_DEPLOY_MODE", "real"),
            ("COINGECKO_API_KEY", "secret"),
            ("VECHAIN_RPC", "https://rpc.example"),
        ]
        .into_iter()
        .collect();

        let mut config = UnityConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.ledger.mode, LedgerMode::Chain);
        assert_eq!(config.feed.api_key.as_deref(), Some("secret"));
        assert_eq!(config.ledger.settlement_url.as_deref(), Some("https://rpc.example"));
    }

    #[test]
    fn test_invalid_mode_rejected() {
        let mut config = UnityConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "UNITY_DEPLOY_MODE").then(|| "testnet".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_fee_rate() {
        let mut config = UnityConfig::default();
        config.economics.burn_fee_rate = dec!(1);
        assert!(config.validate().is_err());

        config.economics.burn_fee_rate = dec!(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chain_mode_needs_settlement_url() {
        let mut config = UnityConfig::default();
        config.ledger.mode = LedgerMode::Chain;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "ledger.settlement_url", .. })
        ));

        config.ledger.settlement_url = Some("https://settlement.example".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unity.toml");
        fs::write(&path, "[feed]\nrequest_timeout_secs = 2\n").unwrap();

        let config = UnityConfig::load_from_file(&path).unwrap();
        assert_eq!(config.feed.request_timeout_secs, 2);
    }
}
