//! Domain layer - Core business logic and entities

pub mod customer;
pub mod error;

pub use customer::{
    Customer, CustomerId, CustomerProjection, CustomerRepository, Gender, RegistrationRequest,
    UpdateRequest, DEFAULT_ROLE,
};
pub use error::DomainError;
