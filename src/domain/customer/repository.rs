//! Customer repository trait

use async_trait::async_trait;

use super::entity::{Customer, CustomerId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Data-access contract shared by every storage backend.
///
/// Backends report a duplicate email on `insert` or `update` as
/// [`DomainError::Conflict`], so a write that lost a race on the email
/// pre-check still fails.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// List all customers, ordered by id
    async fn list(&self) -> Result<Vec<Customer>, DomainError>;

    /// Find a customer by id
    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, DomainError>;

    /// Find a customer by email (exact match)
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError>;

    /// Store a new customer, assigning an id if it has none
    async fn insert(&self, customer: Customer) -> Result<Customer, DomainError>;

    /// Check if any customer holds this email
    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError>;

    /// Check if a customer id exists
    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, DomainError>;

    /// Delete a customer, returning whether a record was removed
    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, DomainError>;

    /// Replace the stored customer with the same id
    async fn update(&self, customer: &Customer) -> Result<(), DomainError>;
}
