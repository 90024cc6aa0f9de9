use anyhow::Result;
use clap::Parser;
use saldo::cli::Cli;
use saldo::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    saldo::logging::init(&config.log_level, cli.verbose);
    cli.run(config).await
}
