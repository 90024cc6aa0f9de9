mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{deposit, open_wallet, test_service, withdraw};
use saldo::{BalanceStore, MAX_BALANCE, WalletError, WalletUpdateRequest};
use tokio::task::JoinSet;

/// Run every request concurrently against the same service; returns the outcomes.
async fn run_concurrently(
    service: Arc<common::TestService>,
    requests: Vec<WalletUpdateRequest>,
) -> Vec<Result<i64, WalletError>> {
    let mut tasks = JoinSet::new();
    for request in requests {
        let service = Arc::clone(&service);
        tasks.spawn(async move { service.apply_operation(&request).await });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.expect("task panicked"));
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_lose_no_update() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let wallet = open_wallet(&service, 1_000).await?;

    let mut requests = Vec::new();
    for _ in 0..40 {
        requests.push(deposit(wallet, 10));
    }
    for _ in 0..20 {
        requests.push(withdraw(wallet, 5));
    }

    let service = Arc::new(service);
    let results = run_concurrently(Arc::clone(&service), requests).await;
    assert!(results.iter().all(|r| r.is_ok()));

    // 1000 + 40 * 10 - 20 * 5
    assert_eq!(service.store().get_balance(wallet).await?, 1_300);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let wallet = open_wallet(&service, 100).await?;

    let requests = (0..30).map(|_| withdraw(wallet, 10)).collect();
    let service = Arc::new(service);
    let results = run_concurrently(Arc::clone(&service), requests).await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(WalletError::InsufficientFunds { .. })))
        .count();
    assert_eq!(accepted, 10);
    assert_eq!(rejected, 20);
    assert_eq!(service.store().get_balance(wallet).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_stop_at_ceiling() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let wallet = open_wallet(&service, MAX_BALANCE - 50).await?;

    let requests = (0..20).map(|_| deposit(wallet, 10)).collect();
    let service = Arc::new(service);
    let results = run_concurrently(Arc::clone(&service), requests).await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 5);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, WalletError::ExceedsMaxBalance { .. }))
    );
    assert_eq!(service.store().get_balance(wallet).await?, MAX_BALANCE);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_on_many_wallets() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut wallets = Vec::new();
    for _ in 0..5 {
        wallets.push(open_wallet(&service, 500).await?);
    }

    let mut requests = Vec::new();
    for wallet in &wallets {
        for _ in 0..10 {
            requests.push(deposit(*wallet, 7));
            requests.push(withdraw(*wallet, 3));
        }
    }

    let service = Arc::new(service);
    let results = run_concurrently(Arc::clone(&service), requests).await;
    assert!(results.iter().all(|r| r.is_ok()));

    for wallet in wallets {
        assert_eq!(service.get_balance(wallet).await?, 540);
    }
    Ok(())
}
