//! Customer directory service

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::customer::{
    merge_update, Customer, CustomerId, CustomerProjection, CustomerRepository,
    RegistrationRequest, UpdateRequest,
};
use crate::domain::DomainError;

use super::keyed_lock::KeyedLocks;
use super::password::PasswordHasher;

const EMAIL_TAKEN: &str = "email already taken";

fn customer_not_found(id: CustomerId) -> DomainError {
    DomainError::not_found(format!("customer with id [{}] not found", id))
}

/// Customer directory service
///
/// Enforces email uniqueness, change detection on update and existence checks
/// on top of any [`CustomerRepository`].
///
/// Lock order is customer id before email.
#[derive(Debug)]
pub struct CustomerService<R: CustomerRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    email_locks: KeyedLocks<String>,
    customer_locks: KeyedLocks<CustomerId>,
}

impl<R: CustomerRepository, H: PasswordHasher> CustomerService<R, H> {
    /// Create a new customer service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self {
            repository,
            hasher,
            email_locks: KeyedLocks::new(),
            customer_locks: KeyedLocks::new(),
        }
    }

    /// List every customer as its external projection
    pub async fn list_all(&self) -> Result<Vec<CustomerProjection>, DomainError> {
        let customers = self.repository.list().await?;
        Ok(customers.into_iter().map(CustomerProjection::from).collect())
    }

    /// Get a single customer
    pub async fn get_by_id(&self, id: CustomerId) -> Result<CustomerProjection, DomainError> {
        self.repository
            .find(id)
            .await?
            .map(CustomerProjection::from)
            .ok_or_else(|| customer_not_found(id))
    }

    /// Register a new customer
    pub async fn register(&self, request: RegistrationRequest) -> Result<(), DomainError> {
        request
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let _guard = self.email_locks.acquire(request.email.clone()).await;

        if self.repository.exists_by_email(&request.email).await? {
            warn!(email = %request.email, "Registration rejected, email already taken");
            return Err(DomainError::conflict(EMAIL_TAKEN));
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let customer = Customer::new(
            request.name,
            request.email,
            password_hash,
            request.age,
            request.gender,
        );

        let stored = self
            .repository
            .insert(customer)
            .await
            .map_err(surface_email_conflict)?;

        debug!(customer_id = ?stored.id(), "Registered customer");
        Ok(())
    }

    /// Delete a customer
    pub async fn delete(&self, id: CustomerId) -> Result<(), DomainError> {
        let _guard = self.customer_locks.acquire(id).await;

        if !self.repository.exists_by_id(id).await? {
            return Err(customer_not_found(id));
        }

        // Another writer sharing the backend may have removed it since the check.
        if !self.repository.delete_by_id(id).await? {
            return Err(customer_not_found(id));
        }

        debug!(customer_id = %id, "Deleted customer");
        Ok(())
    }

    /// Apply a partial update.
    ///
    /// Present fields equal to the stored values are ignored. Fails with a
    /// validation error without writing when nothing would change. The record
    /// stays locked from the read to the write, so concurrent updates of one
    /// customer apply in turn.
    pub async fn update(&self, id: CustomerId, request: UpdateRequest) -> Result<(), DomainError> {
        let _customer_guard = self.customer_locks.acquire(id).await;

        let current = self
            .repository
            .find(id)
            .await?
            .ok_or_else(|| customer_not_found(id))?;

        request
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let merged = merge_update(&current, &request)
            .ok_or_else(|| DomainError::validation("no data changes found"))?;

        if merged.email() == current.email() {
            self.repository.update(&merged).await?;
        } else {
            let _email_guard = self.email_locks.acquire(merged.email().to_string()).await;

            if self.repository.exists_by_email(merged.email()).await? {
                warn!(customer_id = %id, "Update rejected, email already taken");
                return Err(DomainError::conflict(EMAIL_TAKEN));
            }

            self.repository
                .update(&merged)
                .await
                .map_err(surface_email_conflict)?;
        }

        debug!(customer_id = %id, "Updated customer");
        Ok(())
    }

    /// Check an email and password pair.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerProjection, DomainError> {
        let customer = self.repository.find_by_email(email).await?;

        match customer {
            Some(customer) if self.hasher.verify(password, customer.password_hash()) => {
                debug!(customer_id = ?customer.id(), "Customer authenticated");
                Ok(CustomerProjection::from(customer))
            }
            _ => {
                debug!("Authentication failed");
                Err(DomainError::unauthorized("bad credentials"))
            }
        }
    }
}

fn surface_email_conflict(error: DomainError) -> DomainError {
    if error.is_conflict() {
        DomainError::conflict(EMAIL_TAKEN)
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::domain::customer::{Gender, MockCustomerRepository, DEFAULT_ROLE};
    use crate::infrastructure::customer::password::Argon2Hasher;
    use crate::infrastructure::customer::InMemoryCustomerRepository;

    /// In-memory repository whose reads take a while to come back, widening
    /// the gap between an update's read and its write.
    #[derive(Debug)]
    struct SlowReadRepository {
        inner: InMemoryCustomerRepository,
        delay: Duration,
    }

    #[async_trait]
    impl CustomerRepository for SlowReadRepository {
        async fn list(&self) -> Result<Vec<Customer>, DomainError> {
            self.inner.list().await
        }

        async fn find(&self, id: CustomerId) -> Result<Option<Customer>, DomainError> {
            let found = self.inner.find(id).await;
            tokio::time::sleep(self.delay).await;
            found
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
            self.inner.find_by_email(email).await
        }

        async fn insert(&self, customer: Customer) -> Result<Customer, DomainError> {
            self.inner.insert(customer).await
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
            self.inner.exists_by_email(email).await
        }

        async fn exists_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
            self.inner.exists_by_id(id).await
        }

        async fn delete_by_id(&self, id: CustomerId) -> Result<bool, DomainError> {
            self.inner.delete_by_id(id).await
        }

        async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
            self.inner.update(customer).await
        }
    }

    fn create_service() -> CustomerService<InMemoryCustomerRepository, Argon2Hasher> {
        let repository = Arc::new(InMemoryCustomerRepository::new());
        let hasher = Arc::new(Argon2Hasher::new());
        CustomerService::new(repository, hasher)
    }

    fn registration(name: &str, email: &str, age: i32) -> RegistrationRequest {
        RegistrationRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "password".to_string(),
            age,
            gender: Gender::Female,
        }
    }

    fn stored_customer() -> Customer {
        Customer::new("Alex", "alex@example.com", "hash", 21, Gender::Male)
            .with_id(CustomerId::new(1))
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let service = create_service();

        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();
        service
            .register(registration("Jamila", "jamila@example.com", 19))
            .await
            .unwrap();

        let customers = service.list_all().await.unwrap();
        assert_eq!(customers.len(), 2);

        for customer in &customers {
            assert_eq!(customer.username, customer.email);
            assert_eq!(customer.roles, vec![DEFAULT_ROLE.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let repository = Arc::new(InMemoryCustomerRepository::new());
        let service = CustomerService::new(repository.clone(), Arc::new(Argon2Hasher::new()));

        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let stored = repository
            .find_by_email("alex@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash(), "password");
        assert!(Argon2Hasher::new().verify("password", stored.password_hash()));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = create_service();

        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let result = service
            .register(registration("Other", "alex@example.com", 40))
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_invalid_request() {
        let service = create_service();

        let result = service.register(registration("", "alex@example.com", 21)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        let result = service.register(registration("Alex", "not-an-email", 21)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        let result = service.register(registration("Alex", "alex@example.com", 0)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));

        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_with_same_email() {
        let service = Arc::new(create_service());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .register(registration(&format!("Customer {}", i), "same@example.com", 30))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(e) => assert!(e.is_conflict()),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_surfaces_backend_conflict() {
        let mut repository = MockCustomerRepository::new();
        repository.expect_exists_by_email().returning(|_| Ok(false));
        repository
            .expect_insert()
            .times(1)
            .returning(|_| Err(DomainError::conflict("duplicate key")));

        let service = CustomerService::new(Arc::new(repository), Arc::new(Argon2Hasher::new()));
        let result = service
            .register(registration("Alex", "alex@example.com", 21))
            .await;

        let error = result.unwrap_err();
        assert!(error.is_conflict());
        assert!(error.to_string().contains("email already taken"));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let customer = service.get_by_id(CustomerId::new(1)).await.unwrap();
        assert_eq!(customer.name, "Alex");
        assert_eq!(customer.age, 21);

        let missing = service.get_by_id(CustomerId::new(42)).await;
        let error = missing.unwrap_err();
        assert!(matches!(error, DomainError::NotFound { .. }));
        assert!(error.to_string().contains("customer with id [42] not found"));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let id = CustomerId::new(1);
        service.delete(id).await.unwrap();

        assert!(matches!(
            service.get_by_id(id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(service.delete(id).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_of_one_customer() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let id = CustomerId::new(1);
        let (first, second) = tokio::join!(service.delete(id), service.delete(id));

        let removed = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(removed, 1);
        assert!(matches!(
            first.and(second),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_row_removed_elsewhere() {
        let mut repository = MockCustomerRepository::new();
        repository.expect_exists_by_id().returning(|_| Ok(true));
        repository
            .expect_delete_by_id()
            .times(1)
            .returning(|_| Ok(false));

        let service = CustomerService::new(Arc::new(repository), Arc::new(Argon2Hasher::new()));
        let result = service.delete(CustomerId::new(1)).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_never_touches_storage() {
        let mut repository = MockCustomerRepository::new();
        repository.expect_exists_by_id().returning(|_| Ok(false));
        repository.expect_delete_by_id().never();

        let service = CustomerService::new(Arc::new(repository), Arc::new(Argon2Hasher::new()));
        let result = service.delete(CustomerId::new(-1)).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_age_only() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let id = CustomerId::new(1);
        let request = UpdateRequest {
            age: Some(22),
            ..Default::default()
        };
        service.update(id, request).await.unwrap();

        let customer = service.get_by_id(id).await.unwrap();
        assert_eq!(customer.age, 22);
        assert_eq!(customer.name, "Alex");
        assert_eq!(customer.email, "alex@example.com");
        assert_eq!(customer.gender, Gender::Female);
    }

    #[tokio::test]
    async fn test_update_without_changes_writes_nothing() {
        let mut repository = MockCustomerRepository::new();
        repository
            .expect_find()
            .returning(|_| Ok(Some(stored_customer())));
        repository.expect_update().never();

        let service = CustomerService::new(Arc::new(repository), Arc::new(Argon2Hasher::new()));

        let same_values = UpdateRequest {
            name: Some("Alex".to_string()),
            email: Some("alex@example.com".to_string()),
            age: Some(21),
            gender: Some(Gender::Male),
        };
        let result = service.update(CustomerId::new(1), same_values).await;
        let error = result.unwrap_err();
        assert!(matches!(error, DomainError::Validation { .. }));
        assert!(error.to_string().contains("no data changes found"));

        let result = service
            .update(CustomerId::new(1), UpdateRequest::default())
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_writes_merged_record_once() {
        let mut repository = MockCustomerRepository::new();
        repository
            .expect_find()
            .returning(|_| Ok(Some(stored_customer())));
        repository
            .expect_update()
            .withf(|c| c.name() == "Alexander" && c.age() == 21 && c.email() == "alex@example.com")
            .times(1)
            .returning(|_| Ok(()));

        let service = CustomerService::new(Arc::new(repository), Arc::new(Argon2Hasher::new()));
        let request = UpdateRequest {
            name: Some("Alexander".to_string()),
            email: Some("alex@example.com".to_string()),
            ..Default::default()
        };

        service.update(CustomerId::new(1), request).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_updates_of_one_customer_both_apply() {
        let repository = Arc::new(SlowReadRepository {
            inner: InMemoryCustomerRepository::with_customers(vec![stored_customer()]),
            delay: Duration::from_millis(50),
        });
        let service = CustomerService::new(repository.clone(), Arc::new(Argon2Hasher::new()));
        let id = CustomerId::new(1);

        let change_email = UpdateRequest {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let change_age = UpdateRequest {
            age: Some(30),
            ..Default::default()
        };

        let (first, second) = tokio::join!(
            service.update(id, change_email),
            service.update(id, change_age)
        );
        assert!(first.is_ok());
        assert!(second.is_ok());

        let stored = repository.inner.find(id).await.unwrap().unwrap();
        assert_eq!(stored.email(), "new@example.com");
        assert_eq!(stored.age(), 30);
        assert!(!repository.inner.exists_by_email("alex@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_email_collision() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();
        service
            .register(registration("Jamila", "jamila@example.com", 19))
            .await
            .unwrap();

        let request = UpdateRequest {
            email: Some("alex@example.com".to_string()),
            ..Default::default()
        };
        let result = service.update(CustomerId::new(2), request).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let jamila = service.get_by_id(CustomerId::new(2)).await.unwrap();
        assert_eq!(jamila.email, "jamila@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_customer() {
        let service = create_service();

        let request = UpdateRequest {
            age: Some(30),
            ..Default::default()
        };
        let result = service.update(CustomerId::new(9), request).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_invalid_field() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let request = UpdateRequest {
            age: Some(-3),
            ..Default::default()
        };
        let result = service.update(CustomerId::new(1), request).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = create_service();
        service
            .register(registration("Alex", "alex@example.com", 21))
            .await
            .unwrap();

        let customer = service
            .authenticate("alex@example.com", "password")
            .await
            .unwrap();
        assert_eq!(customer.username, "alex@example.com");

        let wrong_password = service.authenticate("alex@example.com", "nope").await;
        assert!(matches!(wrong_password, Err(DomainError::Unauthorized { .. })));

        let unknown = service.authenticate("ghost@example.com", "password").await;
        assert!(matches!(unknown, Err(DomainError::Unauthorized { .. })));
    }
}
