mod backend;
mod postgres;
mod sqlite;
mod store;

pub use backend::*;
pub use postgres::*;
pub use sqlite::*;
pub use store::*;

/// SQL migration for the SQLite wallets table
pub const MIGRATION_001_SQLITE: &str = include_str!("migrations/001_sqlite_wallets.sql");

/// SQL migration for the PostgreSQL wallets table
pub const MIGRATION_001_POSTGRES: &str = include_str!("migrations/001_postgres_wallets.sql");
