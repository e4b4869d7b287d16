//! In-memory customer repository implementation

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::customer::{Customer, CustomerId, CustomerRepository};
use crate::domain::DomainError;

#[derive(Debug)]
struct Store {
    customers: BTreeMap<CustomerId, Customer>,
    /// Index for email -> customer ID lookup
    email_index: HashMap<String, CustomerId>,
    next_id: i32,
}

impl Store {
    fn empty() -> Self {
        Self {
            customers: BTreeMap::new(),
            email_index: HashMap::new(),
            next_id: 1,
        }
    }

    fn put(&mut self, customer: Customer, id: CustomerId) {
        self.next_id = self.next_id.max(id.value() + 1);
        self.email_index.insert(customer.email().to_string(), id);
        self.customers.insert(id, customer.with_id(id));
    }
}

/// In-memory implementation of CustomerRepository.
///
/// Owned by whoever constructs it and shared through `Arc`; each instance is
/// an independent store. Email uniqueness is re-checked under the write lock.
#[derive(Debug)]
pub struct InMemoryCustomerRepository {
    store: RwLock<Store>,
}

impl InMemoryCustomerRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::empty()),
        }
    }

    /// Create a repository with initial customers.
    ///
    /// Customers without an id get one assigned in order.
    pub fn with_customers(customers: Vec<Customer>) -> Self {
        let mut store = Store::empty();

        for customer in customers {
            let id = customer
                .id()
                .unwrap_or_else(|| CustomerId::new(store.next_id));
            store.put(customer, id);
        }

        Self {
            store: RwLock::new(store),
        }
    }
}

impl Default for InMemoryCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn list(&self) -> Result<Vec<Customer>, DomainError> {
        let store = self.store.read().await;
        Ok(store.customers.values().cloned().collect())
    }

    async fn find(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
        let store = self.store.read().await;
        Ok(store.customers.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let store = self.store.read().await;

        Ok(store
            .email_index
            .get(email)
            .and_then(|id| store.customers.get(id))
            .cloned())
    }

    async fn insert(&self, customer: Customer) -> Result<Customer, DomainError> {
        let mut store = self.store.write().await;

        if let Some(id) = customer.id() {
            if store.customers.contains_key(&id) {
                return Err(DomainError::conflict(format!(
                    "customer with id [{}] already exists",
                    id
                )));
            }
        }

        if store.email_index.contains_key(customer.email()) {
            return Err(DomainError::conflict("email already taken"));
        }

        let id = customer
            .id()
            .unwrap_or_else(|| CustomerId::new(store.next_id));
        store.put(customer, id);

        store
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::internal("inserted customer vanished"))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        let store = self.store.read().await;
        Ok(store.email_index.contains_key(email))
    }

    async fn exists_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        let store = self.store.read().await;
        Ok(store.customers.contains_key(&id))
    }

    async fn delete_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
        let mut store = self.store.write().await;

        match store.customers.remove(&id) {
            Some(customer) => {
                store.email_index.remove(customer.email());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut store = self.store.write().await;

        let id = customer
            .id()
            .ok_or_else(|| DomainError::invalid_id("cannot update a customer without an id"))?;

        let old_email = store
            .customers
            .get(&id)
            .map(|c| c.email().to_string())
            .ok_or_else(|| DomainError::not_found(format!("customer with id [{}] not found", id)))?;

        if old_email != customer.email() {
            if store.email_index.contains_key(customer.email()) {
                return Err(DomainError::conflict("email already taken"));
            }

            store.email_index.remove(&old_email);
            store.email_index.insert(customer.email().to_string(), id);
        }

        store.customers.insert(id, customer.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::Gender;

    fn create_test_customer(name: &str, email: &str) -> Customer {
        Customer::new(name, email, "hashed_password", 20, Gender::Male)
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryCustomerRepository::new();

        let first = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();
        let second = repo.insert(create_test_customer("Jamila", "jamila@example.com")).await.unwrap();

        assert_eq!(first.id(), Some(CustomerId::new(1)));
        assert_eq!(second.id(), Some(CustomerId::new(2)));
    }

    #[tokio::test]
    async fn test_find_and_find_by_email() {
        let repo = InMemoryCustomerRepository::new();
        let stored = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();
        let id = stored.id().unwrap();

        let found = repo.find(id).await.unwrap().unwrap();
        assert_eq!(found.name(), "Alex");

        let by_email = repo.find_by_email("alex@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id(), Some(id));

        assert!(repo.find(CustomerId::new(-1)).await.unwrap().is_none());
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let repo = InMemoryCustomerRepository::new();
        repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();

        let result = repo.insert(create_test_customer("Other", "alex@example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_never_overwrites_existing_id() {
        let repo = InMemoryCustomerRepository::new();
        let stored = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();

        let clash = create_test_customer("Jamila", "jamila@example.com").with_id(stored.id().unwrap());
        let result = repo.insert(clash).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let kept = repo.find(stored.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(kept.name(), "Alex");
    }

    #[tokio::test]
    async fn test_exists_predicates() {
        let repo = InMemoryCustomerRepository::new();
        let stored = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();

        assert!(repo.exists_by_email("alex@example.com").await.unwrap());
        assert!(!repo.exists_by_email("ALEX@example.com").await.unwrap());
        assert!(repo.exists_by_id(stored.id().unwrap()).await.unwrap());
        assert!(!repo.exists_by_id(CustomerId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let repo = InMemoryCustomerRepository::new();
        let stored = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();
        let id = stored.id().unwrap();

        assert!(repo.delete_by_id(id).await.unwrap());
        assert!(repo.find(id).await.unwrap().is_none());
        assert!(!repo.exists_by_email("alex@example.com").await.unwrap());

        assert!(!repo.delete_by_id(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_record_and_reindexes_email() {
        let repo = InMemoryCustomerRepository::new();
        let mut stored = repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();

        stored.set_email("alex@new.example.com");
        stored.set_age(33);
        repo.update(&stored).await.unwrap();

        let found = repo.find(stored.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found.age(), 33);
        assert_eq!(found.email(), "alex@new.example.com");
        assert!(!repo.exists_by_email("alex@example.com").await.unwrap());
        assert!(repo.exists_by_email("alex@new.example.com").await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let repo = InMemoryCustomerRepository::new();
        repo.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();
        let mut jamila = repo.insert(create_test_customer("Jamila", "jamila@example.com")).await.unwrap();

        jamila.set_email("alex@example.com");
        let result = repo.update(&jamila).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let kept = repo.find(jamila.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(kept.email(), "jamila@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_customer() {
        let repo = InMemoryCustomerRepository::new();
        let ghost = create_test_customer("Ghost", "ghost@example.com").with_id(CustomerId::new(7));

        let result = repo.update(&ghost).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_with_customers_and_stable_order() {
        let repo = InMemoryCustomerRepository::with_customers(vec![
            create_test_customer("Alex", "alex@example.com"),
            create_test_customer("Jamila", "jamila@example.com"),
        ]);

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Alex", "Jamila"]);

        let next = repo.insert(create_test_customer("Ana", "ana@example.com")).await.unwrap();
        assert_eq!(next.id(), Some(CustomerId::new(3)));
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let first = InMemoryCustomerRepository::new();
        let second = InMemoryCustomerRepository::new();

        first.insert(create_test_customer("Alex", "alex@example.com")).await.unwrap();

        assert!(second.list().await.unwrap().is_empty());
    }
}
