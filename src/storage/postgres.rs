use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, warn};

use crate::domain::{Balance, Wallet, WalletId, is_valid_balance};

use super::{BalanceStore, MIGRATION_001_POSTGRES, PoolSettings, StoreError, insert_error};

/// Balance store backed by PostgreSQL.
///
/// Mutations lock the wallet's row with `SELECT ... FOR UPDATE` and write it
/// back with a separate `UPDATE` in the same transaction. Mutations of
/// different wallets take different row locks and run in parallel.
pub struct PgBalanceStore {
    pool: PgPool,
}

impl PgBalanceStore {
    /// Create a new store with the given PostgreSQL connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to a PostgreSQL database.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_POSTGRES)
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
impl BalanceStore for PgBalanceStore {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance, StoreError> {
        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1")
            .bind(wallet_id)
            .fetch_optional(&self.pool)
            .await?;

        balance.ok_or(StoreError::NotFound(wallet_id))
    }

    async fn update_balance<F, E>(&self, wallet_id: WalletId, decide: F) -> Result<Balance, E>
    where
        F: FnOnce(Balance) -> Result<Balance, E> + Send,
        E: From<StoreError> + Send,
    {
        // Dropping `tx` before commit rolls it back.
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        // Blocks while another transaction holds this row.
        let current: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1 FOR UPDATE")
                .bind(wallet_id)
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

        sqlx::query("UPDATE wallets SET balance = $1 WHERE id = $2")
            .bind(new_balance)
            .bind(wallet_id)
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

        sqlx::query("INSERT INTO wallets (id, balance) VALUES ($1, $2)")
            .bind(wallet_id)
            .bind(opening_balance)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(wallet_id, e))?;

        Ok(Wallet::new(wallet_id, opening_balance))
    }
}
