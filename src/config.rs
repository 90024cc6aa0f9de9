use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenv::dotenv;

use crate::cache::{CACHE_TTL, DEFAULT_MAX_ENTRIES, DEFAULT_POOL_SIZE};
use crate::storage::PoolSettings;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:saldo.db";

/// Runtime configuration, read from the environment (and an optional `.env` file).
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
    /// Redis address; the in-process cache is used when unset.
    pub redis_addr: Option<String>,
    pub redis_pool_size: usize,
    pub pool: PoolSettings,
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("redis_addr", &self.redis_addr.as_ref().map(|_| "<redacted>"))
            .field("redis_pool_size", &self.redis_pool_size)
            .field("pool", &self.pool)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            cache_ttl: CACHE_TTL,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            redis_addr: None,
            redis_pool_size: DEFAULT_POOL_SIZE,
            pool: PoolSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Unset variables fall back to defaults; malformed numbers are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let cache_ttl = match parse_var::<u64>(&lookup, "CACHE_TTL_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.cache_ttl,
        };
        let busy_timeout = match parse_var::<u64>(&lookup, "DB_BUSY_TIMEOUT_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.pool.busy_timeout,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            cache_ttl,
            cache_max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")?
                .unwrap_or(defaults.cache_max_entries),
            redis_addr: lookup("REDIS_ADDR").filter(|addr| !addr.trim().is_empty()),
            redis_pool_size: parse_var(&lookup, "REDIS_POOL_SIZE")?
                .unwrap_or(defaults.redis_pool_size),
            pool: PoolSettings {
                max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS")?
                    .unwrap_or(defaults.pool.max_connections),
                busy_timeout,
            },
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, value))
        })
        .transpose()
}
