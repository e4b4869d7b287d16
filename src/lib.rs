//! Customer Directory
//!
//! Registration, lookup, partial update and deletion of customer records,
//! with bearer-token credentials and a choice of storage backends:
//! - in-memory (development and tests)
//! - PostgreSQL with hand-written queries
//! - PostgreSQL with derived row mapping

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use api::state::{AppState, CustomerServiceTrait};
use domain::customer::{Customer, CustomerRepository, Gender};
use infrastructure::{
    auth::{JwtConfig, JwtService, TokenIssuer},
    customer::{
        Argon2Hasher, CustomerService, InMemoryCustomerRepository, MappedCustomerRepository,
        PasswordHasher, PostgresCustomerRepository,
    },
    storage::{PostgresConfig, StorageFactory, StorageType},
};

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_backend: StorageType = config.storage.backend.parse()?;
    info!("Storage backend: {}", storage_backend);

    let hasher = Arc::new(Argon2Hasher::new());

    let customer_service: Arc<dyn CustomerServiceTrait> = match storage_backend {
        StorageType::InMemory => {
            let repository = if config.storage.seed_demo_data {
                info!("Seeding demo customers");
                InMemoryCustomerRepository::with_customers(demo_customers(&*hasher)?)
            } else {
                InMemoryCustomerRepository::new()
            };

            service(repository, hasher)
        }
        StorageType::Postgres => {
            let pool = StorageFactory::create_postgres(&postgres_config(config)?).await?;
            service(PostgresCustomerRepository::new(pool), hasher)
        }
        StorageType::PostgresMapped => {
            let pool = StorageFactory::create_postgres(&postgres_config(config)?).await?;
            service(MappedCustomerRepository::new(pool), hasher)
        }
    };

    let token_issuer = create_token_issuer(config);

    Ok(AppState::new(customer_service, token_issuer))
}

fn service<R>(repository: R, hasher: Arc<Argon2Hasher>) -> Arc<dyn CustomerServiceTrait>
where
    R: CustomerRepository + 'static,
{
    Arc::new(CustomerService::new(Arc::new(repository), hasher))
}

fn postgres_config(config: &AppConfig) -> anyhow::Result<PostgresConfig> {
    let url = config.storage.resolve_database_url().ok_or_else(|| {
        domain::DomainError::configuration(format!(
            "Storage backend '{}' requires storage.database_url or DATABASE_URL",
            config.storage.backend
        ))
    })?;

    Ok(PostgresConfig::new(url).with_max_connections(config.storage.max_connections.max(1)))
}

/// Generate a random JWT secret
fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Create the token issuer from the configured secret, `JWT_SECRET`, or a random one
fn create_token_issuer(config: &AppConfig) -> Arc<dyn TokenIssuer> {
    let secret = config
        .auth
        .jwt_secret
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| {
            warn!(
                "No JWT secret configured. Generating random secret. \
                Tokens will NOT survive a restart. Set JWT_SECRET for persistent tokens."
            );
            generate_random_secret()
        });

    Arc::new(JwtService::new(JwtConfig::new(
        secret,
        config.auth.jwt_issuer.clone(),
        config.auth.jwt_expiration_hours,
    )))
}

// ============================================================================
// Demo Data
// ============================================================================

fn demo_customers(hasher: &dyn PasswordHasher) -> anyhow::Result<Vec<Customer>> {
    let password = hasher.hash("password")?;

    Ok(vec![
        Customer::new("Alex", "alex@gmail.com", password.clone(), 21, Gender::Male),
        Customer::new("Jamila", "jamila@gmail.com", password, 19, Gender::Female),
    ])
}
