use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::{debug, info};

use crate::domain::{Balance, WalletId};

use super::{BalanceCache, CacheError};

/// How long connection setup may take, PING included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_POOL_SIZE: usize = 10;

/// Key under which a wallet's balance is cached.
pub fn balance_key(wallet_id: WalletId) -> String {
    format!("wallet:{}:balance", wallet_id)
}

/// Balance cache shared through a Redis server.
///
/// Holds `pool_size` auto-reconnecting connections and hands them out round-robin.
pub struct RedisBalanceCache {
    connections: Vec<ConnectionManager>,
    next: AtomicUsize,
}

impl RedisBalanceCache {
    /// Connect to Redis at `addr` (`host:port` or a `redis://` URL).
    ///
    /// Every connection must answer PING within [`CONNECT_TIMEOUT`].
    pub async fn connect(addr: &str, pool_size: usize) -> Result<Self> {
        let client = Client::open(redis_url(addr).as_str())
            .with_context(|| format!("Invalid Redis address: {}", addr))?;

        let pool_size = pool_size.max(1);
        let mut connections = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let conn = tokio::time::timeout(CONNECT_TIMEOUT, open_connection(&client))
                .await
                .with_context(|| format!("Timed out connecting to Redis at {}", addr))??;
            connections.push(conn);
        }

        info!(pool_size, "connected to Redis");
        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }

    fn connection(&self) -> ConnectionManager {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[slot].clone()
    }
}

async fn open_connection(client: &Client) -> Result<ConnectionManager> {
    let mut conn = ConnectionManager::new(client.clone())
        .await
        .context("Failed to connect to Redis")?;
    redis::cmd("PING")
        .query_async::<()>(&mut conn)
        .await
        .context("Redis did not answer PING")?;
    Ok(conn)
}

fn redis_url(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{}", addr)
    }
}

fn unavailable(err: RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}

#[async_trait]
impl BalanceCache for RedisBalanceCache {
    async fn get(&self, wallet_id: WalletId) -> Result<Balance, CacheError> {
        let mut conn = self.connection();
        let balance: Option<Balance> = conn
            .get(balance_key(wallet_id))
            .await
            .map_err(unavailable)?;
        balance.ok_or(CacheError::Miss(wallet_id))
    }

    // PX rather than EX so sub-second TTLs are honored.
    async fn set(&self, wallet_id: WalletId, balance: Balance, ttl: Duration) -> Result<(), CacheError> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.connection();
        conn.pset_ex::<_, _, ()>(balance_key(wallet_id), balance, millis)
            .await
            .map_err(unavailable)?;
        debug!(%wallet_id, balance, "balance cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_balance_key_format() {
        let id = Uuid::parse_str("6f1d6c1e-8b0a-4a43-9c1e-2b6f4f1c0d11").unwrap();
        assert_eq!(
            balance_key(id),
            "wallet:6f1d6c1e-8b0a-4a43-9c1e-2b6f4f1c0d11:balance"
        );
    }

    #[test]
    fn test_redis_url_accepts_bare_address() {
        assert_eq!(redis_url("localhost:6379"), "redis://localhost:6379");
        assert_eq!(redis_url("redis://cache:6379/2"), "redis://cache:6379/2");
        assert_eq!(redis_url("rediss://cache:6380"), "rediss://cache:6380");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_setup() {
        let started = std::time::Instant::now();
        assert!(RedisBalanceCache::connect("127.0.0.1:1", 1).await.is_err());
        assert!(started.elapsed() < CONNECT_TIMEOUT + Duration::from_secs(1));
    }
}
