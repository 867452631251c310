//! Immutable snapshot and transaction records
//!
//! Every record here is created once and appended to the snapshot store.
//! Nothing in the workspace mutates a record after it has been persisted.

use crate::config::LedgerMode;
use crate::token::{ReserveAmounts, TokenPrices, TokenSymbol, TokenWeights};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserve holdings backing UNITY at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSnapshot {
    pub vet_amount: Decimal,
    pub vtho_amount: Decimal,
    pub b3tr_amount: Decimal,
    pub contract_address: Option<String>,
    pub snapshot_at: DateTime<Utc>,
}

impl ReserveSnapshot {
    pub fn new(amounts: ReserveAmounts, contract_address: Option<String>) -> Self {
        let amounts = amounts.rounded();
        Self {
            vet_amount: amounts.vet,
            vtho_amount: amounts.vtho,
            b3tr_amount: amounts.b3tr,
            contract_address,
            snapshot_at: Utc::now(),
        }
    }

    /// Zero reserves, used when nothing has been recorded yet
    pub fn empty() -> Self {
        Self::new(ReserveAmounts::ZERO, None)
    }

    pub fn amounts(&self) -> ReserveAmounts {
        ReserveAmounts::new(self.vet_amount, self.vtho_amount, self.b3tr_amount)
    }

    pub fn amount(&self, token: TokenSymbol) -> Decimal {
        self.amounts().get(token)
    }
}

/// One UNITY price computation with every intermediate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub unity_price_usd: Decimal,
    pub vet_price_usd: Decimal,
    pub vtho_price_usd: Decimal,
    pub b3tr_price_usd: Decimal,
    pub vet_weight: Decimal,
    pub vtho_weight: Decimal,
    pub b3tr_weight: Decimal,
    pub source: String,
    pub metadata: serde_json::Value,
    pub calculated_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(
        unity_price_usd: Decimal,
        prices: TokenPrices,
        weights: TokenWeights,
        source: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let prices = prices.rounded();
        let weights = weights.rounded();
        Self {
            unity_price_usd: crate::round_persisted(unity_price_usd),
            vet_price_usd: prices.vet,
            vtho_price_usd: prices.vtho,
            b3tr_price_usd: prices.b3tr,
            vet_weight: weights.vet,
            vtho_weight: weights.vtho,
            b3tr_weight: weights.b3tr,
            source: source.into(),
            metadata,
            calculated_at: Utc::now(),
        }
    }

    pub fn prices(&self) -> TokenPrices {
        TokenPrices::new(self.vet_price_usd, self.vtho_price_usd, self.b3tr_price_usd)
    }

    pub fn weights(&self) -> TokenWeights {
        TokenWeights::new(self.vet_weight, self.vtho_weight, self.b3tr_weight)
    }
}

/// Price answer handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResult {
    pub unity_price_usd: Decimal,
    pub token_prices: TokenPrices,
    pub weights: TokenWeights,
    pub source: String,
}

impl From<&PriceSnapshot> for PriceResult {
    fn from(snapshot: &PriceSnapshot) -> Self {
        Self {
            unity_price_usd: snapshot.unity_price_usd,
            token_prices: snapshot.prices(),
            weights: snapshot.weights(),
            source: snapshot.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Mint,
    Burn,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Mint => write!(f, "mint"),
            TransactionKind::Burn => write!(f, "burn"),
            TransactionKind::Transfer => write!(f, "transfer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
}

/// Audit record of one successful ledger operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnityTransactionRecord {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub unity_amount: Decimal,
    /// Counterpart token; absent for transfers
    pub token_type: Option<TokenSymbol>,
    pub token_amount: Decimal,
    pub exchange_rate: Decimal,
    pub tx_hash: String,
    pub status: TransactionStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl UnityTransactionRecord {
    pub fn completed(
        kind: TransactionKind,
        unity_amount: Decimal,
        token_type: Option<TokenSymbol>,
        token_amount: Decimal,
        tx_hash: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let exchange_rate = if unity_amount.is_zero() {
            Decimal::ZERO
        } else {
            crate::round_persisted(token_amount / unity_amount)
        };

        Self {
            kind,
            unity_amount: crate::round_persisted(unity_amount),
            token_type,
            token_amount: crate::round_persisted(token_amount),
            exchange_rate,
            tx_hash: tx_hash.into(),
            status: TransactionStatus::Completed,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// A deployed UNITY contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub mode: LedgerMode,
    pub initial_supply: Decimal,
    pub deployed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reserve_snapshot_rounds_to_persisted_scale() {
        let snapshot = ReserveSnapshot::new(
            ReserveAmounts::new(dec!(1.123456789), dec!(0), dec!(2)),
            Some("0xabc".to_string()),
        );
        assert_eq!(snapshot.vet_amount, dec!(1.12345679));
        assert_eq!(snapshot.amount(TokenSymbol::B3tr), dec!(2));
    }

    #[test]
    fn test_transaction_exchange_rate() {
        let record = UnityTransactionRecord::completed(
            TransactionKind::Mint,
            dec!(100),
            Some(TokenSymbol::Vet),
            dec!(5),
            "0x01",
            serde_json::Value::Null,
        );
        assert_eq!(record.exchange_rate, dec!(0.05));
        assert_eq!(record.status, TransactionStatus::Completed);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "mint");
        assert_eq!(json["tokenType"], "VET");
    }

    #[test]
    fn test_price_result_from_snapshot() {
        let snapshot = PriceSnapshot::new(
            dec!(0.03),
            TokenPrices::new(dec!(0.03), dec!(0.002), dec!(0.05)),
            TokenWeights::new(dec!(1), dec!(0), dec!(0)),
            "coingecko",
            serde_json::json!({}),
        );
        let result = PriceResult::from(&snapshot);
        assert_eq!(result.unity_price_usd, dec!(0.03));
        assert_eq!(result.weights.vet, dec!(1));
        assert_eq!(result.source, "coingecko");
    }
}
