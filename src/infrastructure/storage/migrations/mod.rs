//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// PostgreSQL migrator tracking applied versions in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Runs a single migration; returns false if it was already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to start migration: {}", e)))?;

        sqlx::query(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to record migration {}: {}", migration.version, e))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        info!(version = migration.version, description = %migration.description, "Applied migration");
        Ok(true)
    }

    /// Reverts a single migration; returns false if it was not applied
    pub async fn revert_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to start revert: {}", e)))?;

        sqlx::query(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit revert: {}", e)))?;

        info!(version = migration.version, "Reverted migration");
        Ok(true)
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations WHERE success = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Schema of the customer directory, in ascending version order
pub fn customer_migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "Create customer table",
        r#"
        CREATE TABLE IF NOT EXISTS customer (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            age INT NOT NULL,
            gender TEXT NOT NULL,
            CONSTRAINT customer_email_unique UNIQUE (email)
        )
        "#,
        "DROP TABLE IF EXISTS customer",
    )]
}

/// Apply all pending customer migrations
pub async fn run_customer_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in customer_migrations() {
        migrator.run_migration(&migration).await?;
    }

    Ok(())
}

/// Revert the most recently applied customer migration, returning its version
pub async fn revert_last_customer_migration(pool: &PgPool) -> Result<Option<i64>, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    let Some(current) = migrator.current_version().await? else {
        return Ok(None);
    };

    match customer_migrations().into_iter().find(|m| m.version == current) {
        Some(migration) => {
            migrator.revert_migration(&migration).await?;
            Ok(Some(current))
        }
        None => Err(DomainError::storage(format!(
            "Applied migration {} is unknown to this build",
            current
        ))),
    }
}
