//! Application state for shared services

use std::sync::Arc;

use crate::domain::customer::{
    CustomerId, CustomerProjection, CustomerRepository, RegistrationRequest, UpdateRequest,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::TokenIssuer;
use crate::infrastructure::customer::{CustomerService, PasswordHasher};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub customer_service: Arc<dyn CustomerServiceTrait>,
    pub token_issuer: Arc<dyn TokenIssuer>,
}

impl AppState {
    pub fn new(
        customer_service: Arc<dyn CustomerServiceTrait>,
        token_issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            customer_service,
            token_issuer,
        }
    }
}

/// Trait for customer directory operations
#[async_trait::async_trait]
pub trait CustomerServiceTrait: Send + Sync {
    async fn list_all(&self) -> Result<Vec<CustomerProjection>, DomainError>;
    async fn get_by_id(&self, id: CustomerId) -> Result<CustomerProjection, DomainError>;
    async fn register(&self, request: RegistrationRequest) -> Result<(), DomainError>;
    async fn delete(&self, id: CustomerId) -> Result<(), DomainError>;
    async fn update(&self, id: CustomerId, request: UpdateRequest) -> Result<(), DomainError>;
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerProjection, DomainError>;
}

#[async_trait::async_trait]
impl<R, H> CustomerServiceTrait for CustomerService<R, H>
where
    R: CustomerRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn list_all(&self) -> Result<Vec<CustomerProjection>, DomainError> {
        CustomerService::list_all(self).await
    }

    async fn get_by_id(&self, id: CustomerId) -> Result<CustomerProjection, DomainError> {
        CustomerService::get_by_id(self, id).await
    }

    async fn register(&self, request: RegistrationRequest) -> Result<(), DomainError> {
        CustomerService::register(self, request).await
    }

    async fn delete(&self, id: CustomerId) -> Result<(), DomainError> {
        CustomerService::delete(self, id).await
    }

    async fn update(&self, id: CustomerId, request: UpdateRequest) -> Result<(), DomainError> {
        CustomerService::update(self, id, request).await
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerProjection, DomainError> {
        CustomerService::authenticate(self, email, password).await
    }
}
