use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use crate::domain::{Balance, WalletId};

use super::{BalanceCache, CacheError};

/// Upper bound on cached wallets.
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone, Copy)]
struct Entry {
    balance: Balance,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<WalletId, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &WalletId, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    // A refresh restarts the clock.
    fn expire_after_update(
        &self,
        _key: &WalletId,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process balance cache backed by moka.
#[derive(Clone)]
pub struct MemoryBalanceCache {
    inner: Cache<WalletId, Entry>,
}

impl MemoryBalanceCache {
    /// Create a cache holding at most `max_entries` wallets.
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Approximate number of live entries.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryBalanceCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl BalanceCache for MemoryBalanceCache {
    async fn get(&self, wallet_id: WalletId) -> Result<Balance, CacheError> {
        self.inner
            .get(&wallet_id)
            .await
            .map(|entry| entry.balance)
            .ok_or(CacheError::Miss(wallet_id))
    }

    async fn set(&self, wallet_id: WalletId, balance: Balance, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(wallet_id, Entry { balance, ttl }).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_get_missing_is_miss() {
        let cache = MemoryBalanceCache::default();
        let id = Uuid::new_v4();
        assert_eq!(cache.get(id).await, Err(CacheError::Miss(id)));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryBalanceCache::default();
        let id = Uuid::new_v4();
        cache.set(id, 700, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(id).await, Ok(700));

        cache.set(id, 650, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(id).await, Ok(650));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryBalanceCache::default();
        let id = Uuid::new_v4();
        cache.set(id, 700, Duration::from_millis(50)).await.unwrap();
        assert_eq!(cache.get(id).await, Ok(700));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get(id).await, Err(CacheError::Miss(id)));
    }

    #[tokio::test]
    async fn test_len_counts_distinct_wallets() {
        let cache = MemoryBalanceCache::default();
        assert!(cache.is_empty().await);

        let id = Uuid::new_v4();
        cache.set(id, 1, Duration::from_secs(60)).await.unwrap();
        cache.set(id, 2, Duration::from_secs(60)).await.unwrap();
        cache.set(Uuid::new_v4(), 3, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len().await, 2);
    }
}
