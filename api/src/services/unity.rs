//! Unity service - pricing, reserves and ledger operations

use crate::models::*;
use crate::{ApiError, ApiResult, ApiState};
use rust_decimal::Decimal;
use unity_core::{PriceResult, PriceSnapshot, ReserveSnapshot, TokenSymbol, UnityTransactionRecord};
use unity_economics::SupplyStats;
use unity_ledger::ContractInfo;

/// Service for Unity operations
#[derive(Clone)]
pub struct UnityService {
    state: ApiState,
}

fn parse_token(symbol: &str) -> ApiResult<TokenSymbol> {
    Ok(symbol.parse::<TokenSymbol>()?)
}

impl UnityService {
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ApiState {
        &self.state
    }

    /// Latest stored price, computed once if none exists
    pub async fn get_price(&self) -> ApiResult<PriceResult> {
        Ok(self.state.oracle.latest_price().await?)
    }

    pub async fn recalculate_price(&self, request: RecalculatePriceRequest) -> ApiResult<PriceResult> {
        Ok(self
            .state
            .oracle
            .calculate_price(request.circulating_supply)
            .await?)
    }

    pub fn get_reserves(&self) -> ReserveSnapshot {
        self.state.reserves.current()
    }

    pub fn price_history(&self, limit: usize) -> ApiResult<Vec<PriceSnapshot>> {
        Ok(self.state.oracle.history(limit)?)
    }

    pub fn reserve_history(&self, limit: usize) -> ApiResult<Vec<ReserveSnapshot>> {
        Ok(self.state.reserves.history(limit)?)
    }

    pub fn transactions(&self, limit: usize) -> ApiResult<Vec<UnityTransactionRecord>> {
        Ok(self.state.ledger.transactions(limit)?)
    }

    /// Deploy the contract; omitted fields come from the ledger config
    pub async fn deploy(&self, request: DeployRequest) -> ApiResult<DeployResponse> {
        let defaults = &self.state.config.ledger;
        let name = request.name.unwrap_or_else(|| defaults.token_name.clone());
        let symbol = request
            .symbol
            .unwrap_or_else(|| defaults.token_symbol.clone());
        let initial_supply = request.initial_supply.unwrap_or(defaults.initial_supply);

        let deployment = self
            .state
            .ledger
            .deploy(&name, &symbol, initial_supply)
            .await?;

        Ok(DeployResponse {
            address: deployment.address,
            mode: deployment.mode,
            name: deployment.name,
            symbol: deployment.symbol,
        })
    }

    pub async fn contract_info(&self) -> ApiResult<ContractInfo> {
        Ok(self.state.ledger.contract_info().await?)
    }

    pub async fn mint(&self, request: MintRequest) -> ApiResult<MintResponse> {
        if request.recipient_address.trim().is_empty() {
            return Err(ApiError::BadRequest("recipientAddress required".to_string()));
        }
        let token = parse_token(&request.deposit_token)?;

        let receipt = self
            .state
            .ledger
            .mint(
                &request.recipient_address,
                request.amount,
                token,
                request.deposit_amount,
            )
            .await?;

        Ok(MintResponse {
            tx_hash: receipt.tx_hash,
            unity_minted: receipt.unity_minted,
        })
    }

    pub async fn burn(&self, request: BurnRequest) -> ApiResult<BurnResponse> {
        if request.user_address.trim().is_empty() {
            return Err(ApiError::BadRequest("userAddress required".to_string()));
        }
        let token = parse_token(&request.token_to_release)?;

        let receipt = self
            .state
            .ledger
            .burn(&request.user_address, request.amount, token)
            .await?;

        Ok(BurnResponse {
            tx_hash: receipt.tx_hash,
            token_released: receipt.token_released,
            token: receipt.token.to_string(),
        })
    }

    pub async fn transfer(&self, request: TransferRequest) -> ApiResult<TransferResponse> {
        if request.to_address.trim().is_empty() {
            return Err(ApiError::BadRequest("toAddress required".to_string()));
        }
        let receipt = self
            .state
            .ledger
            .transfer(
                request.from_address.as_deref(),
                &request.to_address,
                request.amount,
            )
            .await?;

        Ok(TransferResponse {
            tx_hash: receipt.tx_hash,
            from: receipt.from,
            to: receipt.to,
            amount: receipt.amount,
        })
    }

    pub async fn balance(&self, address: &str) -> ApiResult<BalanceResponse> {
        let balance: Decimal = self.state.ledger.balance_of(address).await?;
        Ok(BalanceResponse {
            address: address.to_string(),
            balance,
        })
    }

    pub async fn total_supply(&self) -> ApiResult<TotalSupplyResponse> {
        Ok(TotalSupplyResponse {
            total_supply: self.state.ledger.total_supply().await?,
        })
    }

    pub fn supply_stats(&self) -> SupplyStats {
        self.state.ledger.supply_stats()
    }
}
