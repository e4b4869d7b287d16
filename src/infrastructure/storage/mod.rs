//! Storage infrastructure - backend selection, pooling and schema

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageFactory, StorageType};
pub use migrations::{
    customer_migrations, revert_last_customer_migration, run_customer_migrations, Migration,
    PostgresMigrator,
};
pub use postgres::{connect_pool, PostgresConfig};
