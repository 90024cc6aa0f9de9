pub mod application;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod storage;

pub use application::{WalletError, WalletService};
pub use cache::{AnyBalanceCache, BalanceCache, MemoryBalanceCache, RedisBalanceCache};
pub use domain::*;
pub use storage::{AnyBalanceStore, BalanceStore, PgBalanceStore, SqliteBalanceStore, StoreError};
