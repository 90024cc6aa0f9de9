// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use saldo::storage::PoolSettings;
use saldo::{
    BalanceStore, MemoryBalanceCache, SqliteBalanceStore, WalletId, WalletService,
    WalletUpdateRequest,
};
use tempfile::TempDir;
use uuid::Uuid;

pub type TestService = WalletService<SqliteBalanceStore, MemoryBalanceCache>;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(TestService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let url = format!("sqlite:{}", db_path.display());
    let store = SqliteBalanceStore::init(&url, &PoolSettings::default()).await?;
    Ok((WalletService::new(store, MemoryBalanceCache::default()), temp_dir))
}

/// Seed a wallet with the given opening balance
pub async fn open_wallet(service: &TestService, balance: i64) -> Result<WalletId> {
    let id = Uuid::new_v4();
    service.store().create_wallet(id, balance).await?;
    Ok(id)
}

pub fn deposit(wallet_id: WalletId, amount: i64) -> WalletUpdateRequest {
    WalletUpdateRequest::deposit(wallet_id, amount).unwrap()
}

pub fn withdraw(wallet_id: WalletId, amount: i64) -> WalletUpdateRequest {
    WalletUpdateRequest::withdraw(wallet_id, amount).unwrap()
}
