//! Migrate command - brings the relational schema up to date

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{
    connect_pool, revert_last_customer_migration, run_customer_migrations, PostgresConfig,
    PostgresMigrator,
};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Revert the most recent migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,

    /// Database URL; defaults to `storage.database_url` or `DATABASE_URL`
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Run migrations against the configured database
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let url = args
        .database_url
        .or_else(|| config.storage.resolve_database_url())
        .ok_or_else(|| anyhow::anyhow!("No database URL configured (set DATABASE_URL)"))?;

    let pool = connect_pool(
        &PostgresConfig::new(url).with_max_connections(config.storage.max_connections.max(1)),
    )
    .await?;

    if args.revert {
        match revert_last_customer_migration(&pool).await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("No migrations to revert"),
        }
    } else {
        run_customer_migrations(&pool).await?;
    }

    let version = PostgresMigrator::new(pool).current_version().await?;
    info!(version = ?version, "Schema version");

    Ok(())
}
