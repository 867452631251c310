//! Settlement layer client for the chain-backed ledger

use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Contract calls the chain-backed ledger delegates to
#[async_trait]
pub trait SettlementClient: Send + Sync {
    /// Deploy a contract and return its address
    async fn deploy(
        &self,
        operator: &str,
        name: &str,
        symbol: &str,
        initial_supply: Decimal,
    ) -> Result<String>;

    async fn mint(&self, contract: &str, operator: &str, to: &str, amount: Decimal)
        -> Result<String>;

    async fn burn(
        &self,
        contract: &str,
        operator: &str,
        from: &str,
        amount: Decimal,
    ) -> Result<String>;

    async fn transfer(
        &self,
        contract: &str,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<String>;

    async fn balance_of(&self, contract: &str, address: &str) -> Result<Decimal>;

    async fn total_supply(&self, contract: &str) -> Result<Decimal>;
}

#[derive(Deserialize)]
struct DeployResponse {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxResponse {
    tx_hash: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupplyResponse {
    total_supply: Decimal,
}

/// JSON-over-HTTP settlement gateway
pub struct HttpSettlementClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSettlementClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let url = format!("{}/unity/{}", self.base_url, path);
        let response = self.client.post(&url).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/unity/{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Settlement(format!(
                "settlement layer returned {}: {}",
                status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SettlementClient for HttpSettlementClient {
    async fn deploy(
        &self,
        operator: &str,
        name: &str,
        symbol: &str,
        initial_supply: Decimal,
    ) -> Result<String> {
        let response: DeployResponse = self
            .post(
                "deploy",
                json!({
                    "from": operator,
                    "name": name,
                    "symbol": symbol,
                    "initialSupply": initial_supply,
                }),
            )
            .await?;
        Ok(response.address)
    }

    async fn mint(
        &self,
        contract: &str,
        operator: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<String> {
        let response: TxResponse = self
            .post(
                "mint",
                json!({ "contract": contract, "from": operator, "to": to, "amount": amount }),
            )
            .await?;
        Ok(response.tx_hash)
    }

    async fn burn(
        &self,
        contract: &str,
        operator: &str,
        from: &str,
        amount: Decimal,
    ) -> Result<String> {
        let response: TxResponse = self
            .post(
                "burn",
                json!({ "contract": contract, "operator": operator, "from": from, "amount": amount }),
            )
            .await?;
        Ok(response.tx_hash)
    }

    async fn transfer(
        &self,
        contract: &str,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<String> {
        let response: TxResponse = self
            .post(
                "transfer",
                json!({ "contract": contract, "from": from, "to": to, "amount": amount }),
            )
            .await?;
        Ok(response.tx_hash)
    }

    async fn balance_of(&self, contract: &str, address: &str) -> Result<Decimal> {
        let response: BalanceResponse = self
            .get(&format!("{}/balance/{}", contract, address))
            .await?;
        Ok(response.balance)
    }

    async fn total_supply(&self, contract: &str) -> Result<Decimal> {
        let response: SupplyResponse = self.get(&format!("{}/total-supply", contract)).await?;
        Ok(response.total_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            HttpSettlementClient::new("https://rpc.example.org/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://rpc.example.org");
    }

    #[test]
    fn test_response_shapes() {
        let tx: TxResponse = serde_json::from_str(r#"{"txHash":"0xabc"}"#).unwrap();
        assert_eq!(tx.tx_hash, "0xabc");

        let balance: BalanceResponse = serde_json::from_str(r#"{"balance":"12.5"}"#).unwrap();
        assert_eq!(balance.balance, Decimal::new(125, 1));

        let supply: SupplyResponse = serde_json::from_str(r#"{"totalSupply":"100"}"#).unwrap();
        assert_eq!(supply.total_supply, Decimal::from(100));
    }
}
