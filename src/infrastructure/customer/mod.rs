//! Customer infrastructure module
//!
//! Storage backends for the customer directory (in-memory, PostgreSQL with
//! hand-written row mapping, PostgreSQL with derived row mapping), password
//! hashing with Argon2, and the directory service that ties them together.

mod in_memory;
mod keyed_lock;
mod mapped_repository;
mod password;
mod postgres_repository;
mod service;

pub use in_memory::InMemoryCustomerRepository;
pub use mapped_repository::MappedCustomerRepository;
pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresCustomerRepository;
pub use service::CustomerService;

use sqlx::PgConnection;

use crate::domain::customer::CustomerId;
use crate::domain::DomainError;

const EMAIL_CONSTRAINT: &str = "customer_email_unique";

/// Keeps `nextval` ahead of every stored id, including the given one
const ADVANCE_ID_SEQUENCE: &str = r#"
    SELECT setval(
        pg_get_serial_sequence('customer', 'id'),
        GREATEST((SELECT MAX(id) FROM customer), $1)
    )
"#;

/// Translate a failed write into a domain error.
///
/// Unique violations become conflicts; everything else is a storage error.
pub(crate) fn map_write_error(error: sqlx::Error, action: &str) -> DomainError {
    if let Some(db) = error.as_database_error() {
        if db.is_unique_violation() {
            return unique_violation_error(db.constraint());
        }
    }

    DomainError::storage(format!("Failed to {}: {}", action, error))
}

/// `customer_email_unique` is reported as a taken email, any other key as a
/// duplicate record.
fn unique_violation_error(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(EMAIL_CONSTRAINT) => DomainError::conflict("email already taken"),
        _ => DomainError::conflict("customer already exists"),
    }
}

/// Move the id sequence past a row inserted under an explicit id, so later
/// generated ids do not collide with it.
pub(crate) async fn advance_id_sequence(
    conn: &mut PgConnection,
    id: CustomerId,
) -> Result<(), DomainError> {
    sqlx::query(ADVANCE_ID_SEQUENCE)
        .bind(id.value())
        .execute(conn)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to advance customer id sequence: {}", e)))?;

    Ok(())
}
