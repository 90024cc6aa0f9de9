use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Balance, WalletId};

use super::{BalanceCache, CacheError, MemoryBalanceCache, RedisBalanceCache};

/// A balance cache chosen at runtime: Redis when an address is configured,
/// in-process otherwise.
pub enum AnyBalanceCache {
    Memory(MemoryBalanceCache),
    Redis(RedisBalanceCache),
}

impl AnyBalanceCache {
    pub async fn connect(
        redis_addr: Option<&str>,
        redis_pool_size: usize,
        max_entries: u64,
    ) -> Result<Self> {
        match redis_addr {
            Some(addr) => Ok(Self::Redis(RedisBalanceCache::connect(addr, redis_pool_size).await?)),
            None => Ok(Self::Memory(MemoryBalanceCache::new(max_entries))),
        }
    }
}

#[async_trait]
impl BalanceCache for AnyBalanceCache {
    async fn get(&self, wallet_id: WalletId) -> Result<Balance, CacheError> {
        match self {
            Self::Memory(cache) => cache.get(wallet_id).await,
            Self::Redis(cache) => cache.get(wallet_id).await,
        }
    }

    async fn set(&self, wallet_id: WalletId, balance: Balance, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.set(wallet_id, balance, ttl).await,
            Self::Redis(cache) => cache.set(wallet_id, balance, ttl).await,
        }
    }
}
