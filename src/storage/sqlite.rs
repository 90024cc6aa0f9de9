use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::domain::{Balance, Wallet, WalletId, is_valid_balance};

use super::{BalanceStore, MIGRATION_001_SQLITE, PoolSettings, StoreError, insert_error};

/// Balance store backed by SQLite.
///
/// SQLite has no row locks. Mutations open their transaction with
/// `BEGIN IMMEDIATE`, which takes the database write lock up front: writers to
/// the same wallet are serialized, and so are writers to different wallets.
/// Readers are never blocked (WAL journal).
pub struct SqliteBalanceStore {
    pool: SqlitePool,
}

impl SqliteBalanceStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database, creating the file if it doesn't exist.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid SQLite database URL: {}", database_url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(settings.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_SQLITE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let store = Self::connect(database_url, settings).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl BalanceStore for SqliteBalanceStore {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance, StoreError> {
        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = ?")
            .bind(wallet_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        balance.ok_or(StoreError::NotFound(wallet_id))
    }

    async fn update_balance<F, E>(&self, wallet_id: WalletId, decide: F) -> Result<Balance, E>
    where
        F: FnOnce(Balance) -> Result<Balance, E> + Send,
        E: From<StoreError> + Send,
    {
        let id = wallet_id.to_string();

        // Dropping `tx` before commit rolls it back.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(StoreError::from)?;

        let current: Option<i64> = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let Some(current) = current else {
            debug!(%wallet_id, "lock target does not exist");
            return Err(StoreError::NotFound(wallet_id).into());
        };

        let new_balance = match decide(current) {
            Ok(balance) => balance,
            Err(rejection) => {
                if let Err(e) = tx.rollback().await {
                    warn!(%wallet_id, "rollback after rejected update failed: {}", e);
                }
                return Err(rejection);
            }
        };

        sqlx::query("UPDATE wallets SET balance = ? WHERE id = ?")
            .bind(new_balance)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;

        debug!(%wallet_id, current, new_balance, "balance committed");
        Ok(new_balance)
    }

    async fn create_wallet(
        &self,
        wallet_id: WalletId,
        opening_balance: Balance,
    ) -> Result<Wallet, StoreError> {
        if !is_valid_balance(opening_balance) {
            return Err(StoreError::OutOfRange(opening_balance));
        }

        sqlx::query("INSERT INTO wallets (id, balance) VALUES (?, ?)")
            .bind(wallet_id.to_string())
            .bind(opening_balance)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(wallet_id, e))?;

        Ok(Wallet::new(wallet_id, opening_balance))
    }
}
