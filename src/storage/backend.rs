use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Balance, Wallet, WalletId};

use super::{BalanceStore, PgBalanceStore, PoolSettings, SqliteBalanceStore, StoreError};

/// A balance store chosen at runtime from the database URL scheme.
pub enum AnyBalanceStore {
    Sqlite(SqliteBalanceStore),
    Postgres(PgBalanceStore),
}

/// Returns true if `database_url` points at a PostgreSQL server.
pub fn is_postgres_url(database_url: &str) -> bool {
    database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
}

impl AnyBalanceStore {
    /// Connect to the database named by `database_url`.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        if is_postgres_url(database_url) {
            Ok(Self::Postgres(PgBalanceStore::connect(database_url, settings).await?))
        } else {
            Ok(Self::Sqlite(SqliteBalanceStore::connect(database_url, settings).await?))
        }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.migrate().await,
            Self::Postgres(store) => store.migrate().await,
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Sqlite(store) => store.close().await,
            Self::Postgres(store) => store.close().await,
        }
    }
}

#[async_trait]
impl BalanceStore for AnyBalanceStore {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance, StoreError> {
        match self {
            Self::Sqlite(store) => store.get_balance(wallet_id).await,
            Self::Postgres(store) => store.get_balance(wallet_id).await,
        }
    }

    async fn update_balance<F, E>(&self, wallet_id: WalletId, decide: F) -> Result<Balance, E>
    where
        F: FnOnce(Balance) -> Result<Balance, E> + Send,
        E: From<StoreError> + Send,
    {
        match self {
            Self::Sqlite(store) => store.update_balance(wallet_id, decide).await,
            Self::Postgres(store) => store.update_balance(wallet_id, decide).await,
        }
    }

    async fn create_wallet(
        &self,
        wallet_id: WalletId,
        opening_balance: Balance,
    ) -> Result<Wallet, StoreError> {
        match self {
            Self::Sqlite(store) => store.create_wallet(wallet_id, opening_balance).await,
            Self::Postgres(store) => store.create_wallet(wallet_id, opening_balance).await,
        }
    }
}
