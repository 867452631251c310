//! Integration tests for the Unity service

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use unity_api::models::*;
use unity_api::{ApiState, UnityService};
use unity_core::{CirculatingSupply, LedgerMode, TransactionKind, UnityConfig};
use unity_storage::{MemorySnapshotStore, SledSnapshotStore};

fn offline_config() -> UnityConfig {
    let mut config = UnityConfig::default();
    config.feed.offline = true;
    config
}

fn service() -> UnityService {
    let store = Arc::new(MemorySnapshotStore::new());
    UnityService::new(ApiState::from_config(offline_config(), store).unwrap())
}

fn mint(address: &str, amount: Decimal, token: &str, deposit: Decimal) -> MintRequest {
    MintRequest {
        recipient_address: address.to_string(),
        amount,
        deposit_token: token.to_string(),
        deposit_amount: deposit,
    }
}

#[tokio::test]
async fn test_price_computed_on_first_read() {
    let service = service();
    let price = service.get_price().await.unwrap();

    // No reserves yet
    assert_eq!(price.unity_price_usd, Decimal::ZERO);
    assert_eq!(price.source, "fixed");
    assert_eq!(service.price_history(10).unwrap().len(), 1);

    let again = service.get_price().await.unwrap();
    assert_eq!(price, again);
    assert_eq!(service.price_history(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_token_lifecycle() {
    let service = service();

    let deployed = service.deploy(DeployRequest::default()).await.unwrap();
    assert_eq!(deployed.mode, LedgerMode::Mock);
    assert_eq!(deployed.symbol, "UNITY");
    assert_eq!(
        service.get_reserves().contract_address.as_deref(),
        Some(deployed.address.as_str())
    );

    let minted = service
        .mint(mint("0xalice", dec!(100), "vet", dec!(5)))
        .await
        .unwrap();
    assert_eq!(minted.unity_minted, dec!(100));
    assert!(minted.tx_hash.starts_with("0x"));

    let burned = service
        .burn(BurnRequest {
            user_address: "0xalice".to_string(),
            amount: dec!(40),
            token_to_release: "VTHO".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(burned.token, "VTHO");
    assert_eq!(burned.token_released, dec!(597));

    let transfer = service
        .transfer(TransferRequest {
            from_address: Some("0xalice".to_string()),
            to_address: "0xbob".to_string(),
            amount: dec!(10),
        })
        .await
        .unwrap();
    assert_eq!(transfer.to, "0xbob");

    assert_eq!(service.balance("0xalice").await.unwrap().balance, dec!(50));
    assert_eq!(service.balance("0xbob").await.unwrap().balance, dec!(10));
    assert_eq!(service.total_supply().await.unwrap().total_supply, dec!(60));

    let stats = service.supply_stats();
    assert_eq!(stats.total_minted, dec!(100));
    assert_eq!(stats.total_burned, dec!(40));

    let info = service.contract_info().await.unwrap();
    assert_eq!(info.address, deployed.address);
    assert_eq!(info.total_supply, dec!(60));

    let kinds: Vec<_> = service
        .transactions(10)
        .unwrap()
        .into_iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![TransactionKind::Transfer, TransactionKind::Burn, TransactionKind::Mint]
    );
}

#[tokio::test]
async fn test_recalculate_with_supply() {
    let service = service();
    service.deploy(DeployRequest::default()).await.unwrap();
    service
        .mint(mint("0xalice", dec!(10), "VET", dec!(1000)))
        .await
        .unwrap();

    let price = service
        .recalculate_price(RecalculatePriceRequest {
            circulating_supply: Some(CirculatingSupply::new(
                dec!(100000000000),
                dec!(100000000000),
                dec!(100000000),
            )),
        })
        .await
        .unwrap();

    assert_eq!(price.unity_price_usd, dec!(0.03));
    assert_eq!(price.weights.vet, Decimal::ONE);
}

#[tokio::test]
async fn test_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unity");

    let deployed_address = {
        let store = Arc::new(SledSnapshotStore::open(&path).unwrap());
        let service = UnityService::new(ApiState::from_config(offline_config(), store).unwrap());
        let deployed = service.deploy(DeployRequest::default()).await.unwrap();
        service
            .mint(mint("0xalice", dec!(1), "B3TR", dec!(2.5)))
            .await
            .unwrap();
        service.get_price().await.unwrap();
        deployed.address
    };

    let store = Arc::new(SledSnapshotStore::open(&path).unwrap());
    let service = UnityService::new(ApiState::from_config(offline_config(), store).unwrap());

    let reserves = service.get_reserves();
    assert_eq!(reserves.b3tr_amount, dec!(2.5));
    assert_eq!(reserves.contract_address, Some(deployed_address));
    assert_eq!(service.transactions(10).unwrap().len(), 1);
    assert_eq!(service.reserve_history(10).unwrap().len(), 2);
    assert_eq!(service.price_history(10).unwrap().len(), 1);
}
