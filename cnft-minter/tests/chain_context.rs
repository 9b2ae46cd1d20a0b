mod common;

use std::sync::Arc;

use cnft_minter::{
    errors::InitError, rpc::RpcConnectionConfig, Minter, Notifier, TracingSink,
};
use common::*;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};

fn tracing_notifier() -> Arc<Notifier> {
    Arc::new(Notifier::new(Arc::new(TracingSink)))
}

#[tokio::test]
async fn test_init_rejects_bad_key_material() {
    let operator = Keypair::new();
    let mut config = minter_config(
        &operator,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    config.operator_key = "not-a-key".to_string();

    let err = Minter::<MockRpc>::init(config, tracing_notifier())
        .await
        .unwrap_err();

    assert!(matches!(err, InitError::KeyMaterial(_)));
}

#[tokio::test]
async fn test_init_reports_unreachable_endpoint() {
    let operator = Keypair::new();
    let config = minter_config(
        &operator,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let state = SharedState::default();
    lock(&state).healthy = false;
    let rpc = MockRpc::with_state(
        RpcConnectionConfig::new(config.rpc_url.clone(), Arc::new(operator)),
        state,
    );

    let err = Minter::with_connection(config, rpc, tracing_notifier())
        .await
        .unwrap_err();

    match err {
        InitError::NetworkUnreachable { url, .. } => assert_eq!(url, "http://mock.local:8899"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_init_reads_initial_total() {
    let h = harness(|s| s.tree_sequence = 321).await;

    assert_eq!(h.minter.total_minted(), 321);
    assert_eq!(h.state().tree_reads, 1);
}

#[tokio::test]
async fn test_endpoint_change_rebuilds_client_once() {
    let h = harness(|s| s.tree_sequence = 12).await;
    let before = h.minter.rpc();

    assert!(!h.minter.set_endpoint("http://mock.local:8899").await);
    assert!(Arc::ptr_eq(&before, &h.minter.rpc()));

    assert!(h.minter.set_endpoint("http://other.local:8899").await);
    let after = h.minter.rpc();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(h.minter.context().endpoint(), "http://other.local:8899");
    assert_eq!(h.minter.identity(), h.operator);

    assert!(!h.minter.set_endpoint("http://other.local:8899").await);
    assert!(Arc::ptr_eq(&after, &h.minter.rpc()));
}

#[tokio::test]
async fn test_endpoint_change_refreshes_total() {
    let h = harness(|s| s.tree_sequence = 12).await;
    let url = "http://refresh.local:8899";
    let next = SharedState::default();
    {
        let mut state = lock(&next);
        state.tree = h.tree;
        state.tree_sequence = 77;
    }
    register_endpoint(url, next.clone());

    assert!(h.minter.set_endpoint(url).await);

    assert_eq!(h.minter.total_minted(), 77);
    assert_eq!(lock(&next).tree_reads, 1);
    // the previous endpoint is not read again
    assert_eq!(h.state().tree_reads, 1);
}

#[tokio::test]
async fn test_invalid_tree_account_keeps_previous_total() {
    let h = harness(|s| s.tree_sequence = 5).await;
    {
        let mut state = h.state();
        state.tree_sequence = 8;
        state.tree_account_valid = false;
    }

    assert_eq!(h.minter.refresh_total_minted().await, 5);
    assert_eq!(h.minter.total_minted(), 5);

    h.state().tree_account_valid = true;
    assert_eq!(h.minter.refresh_total_minted().await, 8);
}

#[tokio::test]
async fn test_set_tree_switches_counter_source() {
    let h = harness(|s| s.tree_sequence = 5).await;

    // unknown account, value is kept
    assert_eq!(h.minter.set_tree(Pubkey::new_unique()).await, 5);

    assert_eq!(h.minter.set_tree(h.tree).await, 5);
    h.state().tree_sequence = 6;
    assert_eq!(h.minter.refresh_total_minted().await, 6);
}

#[tokio::test]
async fn test_wallet_count_pages_through_indexer() {
    let h = harness(|_| {}).await;
    h.state().assets = (0..1_005)
        .map(|_| qualifying_asset(&h.tree, &h.collection))
        .collect();

    let owned = h.minter.count_wallet_mints(&Pubkey::new_unique()).await.unwrap();

    assert_eq!(owned, 1_005);
    assert_eq!(h.state().asset_pages_requested, vec![1, 2]);
}

#[tokio::test]
async fn test_wallet_count_ignores_other_trees_and_collections() {
    let h = harness(|_| {}).await;
    let mut uncompressed = qualifying_asset(&h.tree, &h.collection);
    if let Some(compression) = uncompressed.compression.as_mut() {
        compression.compressed = false;
    }
    h.state().assets = vec![
        qualifying_asset(&h.tree, &h.collection),
        qualifying_asset(&Pubkey::new_unique(), &h.collection),
        qualifying_asset(&h.tree, &Pubkey::new_unique()),
        uncompressed,
    ];

    let owned = h.minter.count_wallet_mints(&Pubkey::new_unique()).await.unwrap();

    assert_eq!(owned, 1);
}
