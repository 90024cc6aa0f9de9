mod backend;
mod memory;
mod remote;

pub use backend::*;
pub use memory::*;
pub use remote::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Balance, WalletId};

/// How long a cached balance stays valid.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache miss for wallet {0}")]
    Miss(WalletId),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Non-authoritative key-value accelerator for balance reads.
///
/// Entries may be stale or missing at any time. Nothing reads the cache to
/// decide a mutation.
#[async_trait]
pub trait BalanceCache: Send + Sync {
    /// Last known balance, or [`CacheError::Miss`] if absent or expired.
    async fn get(&self, wallet_id: WalletId) -> Result<Balance, CacheError>;

    /// Store `balance` for `wallet_id`, replacing any previous entry.
    async fn set(&self, wallet_id: WalletId, balance: Balance, ttl: Duration) -> Result<(), CacheError>;
}

