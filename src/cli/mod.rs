//! CLI module for the customer directory
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply (or revert) the relational schema and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Customer directory - registration, lookup and credentials for customers
#[derive(Parser)]
#[command(name = "customer-directory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),
}

/// Load `.env`, configuration and logging shared by every subcommand
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}
