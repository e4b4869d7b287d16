//! PostgreSQL customer repository using hand-written queries and row mapping

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::customer::{Customer, CustomerId, CustomerRepository, Gender};
use crate::domain::DomainError;

use super::{advance_id_sequence, map_write_error};

/// PostgreSQL implementation of CustomerRepository with explicit SQL
#[derive(Debug, Clone)]
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert under a caller-chosen id and advance the id sequence past it.
    ///
    /// The id goes through the primary key, so an existing row is reported as
    /// a conflict rather than overwritten.
    async fn insert_with_id(&self, customer: &Customer, id: CustomerId) -> Result<i32, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO customer (id, name, email, password, age, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(id.value())
        .bind(customer.name())
        .bind(customer.email())
        .bind(customer.password_hash())
        .bind(customer.age())
        .bind(customer.gender().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "insert customer"))?;

        advance_id_sequence(&mut tx, CustomerId::new(id)).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit customer insert: {}", e)))?;

        Ok(id)
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn list(&self) -> Result<Vec<Customer>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password, age, gender
            FROM customer
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list customers: {}", e)))?;

        let mut customers = Vec::with_capacity(rows.len());

        for row in rows {
            customers.push(row_to_customer(&row)?);
        }

        Ok(customers)
    }

    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, age, gender
            FROM customer
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get customer: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password, age, gender
            FROM customer
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get customer by email: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, customer: Customer) -> Result<Customer, DomainError> {
        let id = match customer.id() {
            Some(id) => self.insert_with_id(&customer, id).await?,
            None => sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO customer (name, email, password, age, gender)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(customer.name())
            .bind(customer.email())
            .bind(customer.password_hash())
            .bind(customer.age())
            .bind(customer.gender().as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "insert customer"))?,
        };

        Ok(customer.with_id(CustomerId::new(id)))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check email: {}", e)))
    }

    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check customer id: {}", e)))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete customer: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let id = customer
            .id()
            .ok_or_else(|| DomainError::invalid_id("cannot update a customer without an id"))?;

        let result = sqlx::query(
            r#"
            UPDATE customer
            SET name = $2, email = $3, password = $4, age = $5, gender = $6
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .bind(customer.name())
        .bind(customer.email())
        .bind(customer.password_hash())
        .bind(customer.age())
        .bind(customer.gender().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "update customer"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "customer with id [{}] not found",
                id
            )));
        }

        Ok(())
    }
}

fn row_to_customer(row: &sqlx::postgres::PgRow) -> Result<Customer, DomainError> {
    let id: i32 = row.get("id");
    let name: String = row.get("name");
    let email: String = row.get("email");
    let password: String = row.get("password");
    let age: i32 = row.get("age");
    let gender: String = row.get("gender");

    build_customer(id, name, email, password, age, &gender)
}

fn build_customer(
    id: i32,
    name: String,
    email: String,
    password: String,
    age: i32,
    gender: &str,
) -> Result<Customer, DomainError> {
    let gender: Gender = gender
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid gender in database: {}", e)))?;

    Ok(Customer::new(name, email, password, age, gender).with_id(CustomerId::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_customer_maps_columns() {
        let customer = build_customer(
            1,
            "Jamila".to_string(),
            "Jamila@gmail.com".to_string(),
            "hash".to_string(),
            19,
            "FEMALE",
        )
        .unwrap();

        let expected = Customer::new("Jamila", "Jamila@gmail.com", "hash", 19, Gender::Female)
            .with_id(CustomerId::new(1));
        assert_eq!(customer, expected);
    }

    #[test]
    fn test_build_customer_rejects_unknown_gender() {
        let result = build_customer(
            1,
            "Jamila".to_string(),
            "Jamila@gmail.com".to_string(),
            "hash".to_string(),
            19,
            "OTHER",
        );

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
