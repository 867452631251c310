//! Unity request and response models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unity_core::{CirculatingSupply, LedgerMode};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculatePriceRequest {
    #[serde(default)]
    pub circulating_supply: Option<CirculatingSupply>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub initial_supply: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub address: String,
    pub mode: LedgerMode,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub recipient_address: String,
    pub amount: Decimal,
    pub deposit_token: String,
    pub deposit_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    pub tx_hash: String,
    pub unity_minted: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnRequest {
    /// Wallet of the holder burning UNITY
    pub user_address: String,
    pub amount: Decimal,
    pub token_to_release: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnResponse {
    pub tx_hash: String,
    pub token_released: Decimal,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Operator wallet when omitted
    #[serde(default)]
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSupplyResponse {
    pub total_supply: Decimal,
}
