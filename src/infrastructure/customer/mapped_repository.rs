//! PostgreSQL customer repository using derived row mapping

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::domain::customer::{Customer, CustomerId, CustomerRepository, Gender};
use crate::domain::DomainError;

use super::{advance_id_sequence, map_write_error};

const COLUMNS: &str = "id, name, email, password, age, gender";

/// Row shape of the `customer` table
#[derive(Debug, Clone, FromRow)]
struct CustomerRow {
    id: i32,
    name: String,
    email: String,
    password: String,
    age: i32,
    #[sqlx(try_from = "String")]
    gender: Gender,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer::new(row.name, row.email, row.password, row.age, row.gender)
            .with_id(CustomerId::new(row.id))
    }
}

/// PostgreSQL implementation of CustomerRepository that maps rows onto
/// [`CustomerRow`] with `query_as` instead of reading columns by hand.
#[derive(Debug, Clone)]
pub struct MappedCustomerRepository {
    pool: PgPool,
}

impl MappedCustomerRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for MappedCustomerRepository {
    async fn list(&self) -> Result<Vec<Customer>, DomainError> {
        let sql = format!("SELECT {} FROM customer ORDER BY id", COLUMNS);

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list customers: {}", e)))?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        let sql = format!("SELECT {} FROM customer WHERE id = $1", COLUMNS);

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get customer: {}", e)))?;

        Ok(row.map(Customer::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let sql = format!("SELECT {} FROM customer WHERE email = $1", COLUMNS);

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get customer by email: {}", e)))?;

        Ok(row.map(Customer::from))
    }

    async fn insert(&self, customer: Customer) -> Result<Customer, DomainError> {
        // COALESCE keeps a caller-supplied id; otherwise the serial default applies.
        // A supplied id also moves the sequence past it, in the same transaction.
        let sql = format!(
            r#"
            INSERT INTO customer (id, name, email, password, age, gender)
            VALUES (COALESCE($1, nextval(pg_get_serial_sequence('customer', 'id'))::INT),
                    $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLUMNS
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(customer.id().map(|id| id.value()))
            .bind(customer.name())
            .bind(customer.email())
            .bind(customer.password_hash())
            .bind(customer.age())
            .bind(customer.gender().as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "insert customer"))?;

        if customer.id().is_some() {
            advance_id_sequence(&mut tx, CustomerId::new(row.id)).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit customer insert: {}", e)))?;

        Ok(row.into())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        Ok(self.find(id).await?.is_some())
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM customer WHERE id = $1 RETURNING {}", COLUMNS);

        let removed = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete customer: {}", e)))?;

        if let Some(row) = &removed {
            tracing::debug!(customer_id = row.id, "Removed customer row");
        }

        Ok(removed.is_some())
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let id = customer
            .id()
            .ok_or_else(|| DomainError::invalid_id("cannot update a customer without an id"))?;

        let sql = format!(
            r#"
            UPDATE customer
            SET name = $2, email = $3, password = $4, age = $5, gender = $6
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        let updated = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id.value())
            .bind(customer.name())
            .bind(customer.email())
            .bind(customer.password_hash())
            .bind(customer.age())
            .bind(customer.gender().as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "update customer"))?;

        match updated {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!(
                "customer with id [{}] not found",
                id
            ))),
        }
    }
}
