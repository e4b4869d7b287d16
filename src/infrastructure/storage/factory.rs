//! Storage backend selection

use std::str::FromStr;

use sqlx::PgPool;
use tracing::info;

use crate::domain::DomainError;

use super::migrations::run_customer_migrations;
use super::postgres::{connect_pool, PostgresConfig};

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL with hand-written queries
    Postgres,
    /// PostgreSQL with derived row mapping
    PostgresMapped,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InMemory => "memory",
            Self::Postgres => "postgres",
            Self::PostgresMapped => "postgres-mapped",
        }
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "postgres-mapped" | "postgres_mapped" | "mapped" => Ok(Self::PostgresMapped),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Factory for relational storage connections
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Connect to PostgreSQL and bring the schema up to date
    pub async fn create_postgres(config: &PostgresConfig) -> Result<PgPool, DomainError> {
        let pool = connect_pool(config).await?;
        run_customer_migrations(&pool).await?;

        info!(
            max_connections = config.max_connections,
            "PostgreSQL storage ready"
        );

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!("memory".parse::<StorageType>().unwrap(), StorageType::InMemory);
        assert_eq!("in-memory".parse::<StorageType>().unwrap(), StorageType::InMemory);
        assert_eq!("postgres".parse::<StorageType>().unwrap(), StorageType::Postgres);
        assert_eq!("PG".parse::<StorageType>().unwrap(), StorageType::Postgres);
        assert_eq!(
            "postgres-mapped".parse::<StorageType>().unwrap(),
            StorageType::PostgresMapped
        );
        assert_eq!("mapped".parse::<StorageType>().unwrap(), StorageType::PostgresMapped);

        let unknown = "mongo".parse::<StorageType>();
        assert!(matches!(unknown, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_storage_type_round_trips_through_display() {
        for storage_type in [
            StorageType::InMemory,
            StorageType::Postgres,
            StorageType::PostgresMapped,
        ] {
            assert_eq!(storage_type.to_string().parse::<StorageType>().unwrap(), storage_type);
        }
    }
}
