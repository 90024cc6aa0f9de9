use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Balance, Wallet, WalletId};

/// Failures reported by a [`BalanceStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("wallet not found: {0}")]
    NotFound(WalletId),

    #[error("wallet already exists: {0}")]
    AlreadyExists(WalletId),

    #[error("balance {0} is outside the allowed range")]
    OutOfRange(Balance),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connection pool settings shared by the store backends.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// How long a SQLite connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Durable, authoritative storage of wallet balances.
///
/// Every mutation runs in a single transaction that holds an exclusive lock on
/// the wallet's row from the read until commit, so two mutations of the same
/// wallet never interleave. Stores do no arithmetic: the caller decides the new
/// balance.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Point read of the current balance.
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance, StoreError>;

    /// Lock the wallet's row, hand its current balance to `decide`, and write
    /// back whatever balance `decide` returns.
    ///
    /// If `decide` fails, the transaction is rolled back and its error is
    /// returned untouched. Returns the committed balance.
    async fn update_balance<F, E>(&self, wallet_id: WalletId, decide: F) -> Result<Balance, E>
    where
        F: FnOnce(Balance) -> Result<Balance, E> + Send,
        E: From<StoreError> + Send;

    /// Overwrite the balance of an existing wallet under its row lock.
    async fn set_balance(&self, wallet_id: WalletId, new_balance: Balance) -> Result<(), StoreError> {
        self.update_balance(wallet_id, |_| Ok::<_, StoreError>(new_balance))
            .await?;
        Ok(())
    }

    /// Insert a new wallet row. Used for seeding, not by the wallet service.
    async fn create_wallet(
        &self,
        wallet_id: WalletId,
        opening_balance: Balance,
    ) -> Result<Wallet, StoreError>;
}

/// Map an insert failure to [`StoreError::AlreadyExists`] when it is a key conflict.
pub(crate) fn insert_error(wallet_id: WalletId, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists(wallet_id),
        _ => StoreError::Database(err),
    }
}
