use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::WalletService;
use crate::cache::AnyBalanceCache;
use crate::config::Config;
use crate::domain::{Balance, WalletUpdatePayload, WalletUpdateRequest};
use crate::storage::{AnyBalanceStore, BalanceStore};

type Service = WalletService<AnyBalanceStore, AnyBalanceCache>;

/// Saldo - wallet balances
#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "Deposit into, withdraw from and query wallet balances")]
#[command(version)]
pub struct Cli {
    /// Database URL (sqlite:PATH or postgres://...); overrides DATABASE_URL
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database schema
    Init,

    /// Create a wallet with an opening balance
    Open {
        /// Wallet ID (generated if omitted)
        #[arg(long)]
        id: Option<Uuid>,

        /// Opening balance in minor units
        #[arg(short, long, default_value = "0")]
        balance: Balance,
    },

    /// Show the balance of a wallet
    Balance {
        /// Wallet ID
        wallet: Uuid,
    },

    /// Deposit into a wallet
    Deposit {
        /// Wallet ID
        wallet: Uuid,

        /// Amount in minor units
        amount: Balance,
    },

    /// Withdraw from a wallet
    Withdraw {
        /// Wallet ID
        wallet: Uuid,

        /// Amount in minor units
        amount: Balance,
    },

    /// Apply an update request given as JSON
    /// (e.g. '{"walletId":"...","operationType":"DEPOSIT","amount":100}')
    Apply {
        /// Request body
        payload: String,
    },
}

impl Cli {
    pub async fn run(self, mut config: Config) -> Result<()> {
        if let Some(database) = self.database {
            config.database_url = database;
        }

        let store = AnyBalanceStore::connect(&config.database_url, &config.pool).await?;
        let cache = AnyBalanceCache::connect(
            config.redis_addr.as_deref(),
            config.redis_pool_size,
            config.cache_max_entries,
        )
        .await?;
        let service = WalletService::new(store, cache).with_cache_ttl(config.cache_ttl);

        let result = run_command(&service, self.command).await;
        service.store().close().await;
        result
    }
}

async fn run_command(service: &Service, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            service.store().migrate().await?;
            println!("Database initialized");
        }

        Commands::Open { id, balance } => {
            let wallet = service
                .store()
                .create_wallet(id.unwrap_or_else(Uuid::new_v4), balance)
                .await?;
            println!("Created wallet: {} (balance {})", wallet.id, wallet.balance);
        }

        Commands::Balance { wallet } => {
            let wallet = service.get_wallet(wallet).await?;
            println!("{}", serde_json::to_string(&wallet)?);
        }

        Commands::Deposit { wallet, amount } => {
            let request = WalletUpdateRequest::deposit(wallet, amount)?;
            apply(service, &request).await?;
        }

        Commands::Withdraw { wallet, amount } => {
            let request = WalletUpdateRequest::withdraw(wallet, amount)?;
            apply(service, &request).await?;
        }

        Commands::Apply { payload } => {
            let payload: WalletUpdatePayload =
                serde_json::from_str(&payload).context("Invalid data format")?;
            let request = WalletUpdateRequest::try_from(payload).context("Invalid input")?;
            apply(service, &request).await?;
        }
    }
    Ok(())
}

async fn apply(service: &Service, request: &WalletUpdateRequest) -> Result<()> {
    let balance = service.apply_operation(request).await?;
    println!(
        "{} of {} applied to wallet {}: balance {}",
        request.operation, request.amount, request.wallet_id, balance
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_flag_after_subcommand() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["saldo", "balance", &id, "--database", "sqlite:other.db"])
            .unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite:other.db"));
        assert!(matches!(cli.command, Commands::Balance { wallet } if wallet.to_string() == id));
    }

    #[test]
    fn test_database_flag_before_subcommand() {
        let cli = Cli::try_parse_from(["saldo", "-d", "sqlite:other.db", "init"]).unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite:other.db"));
        assert!(matches!(cli.command, Commands::Init));
    }
}
