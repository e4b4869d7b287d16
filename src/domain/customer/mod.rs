//! Customer domain
//!
//! Entity, requests, the partial-update merge, the external projection and
//! the storage contract every backend implements.

mod entity;
mod projection;
mod repository;
mod request;
mod validation;

pub use entity::{Customer, CustomerId, Gender};
pub use projection::{CustomerProjection, DEFAULT_ROLE};
pub use repository::CustomerRepository;
pub use request::{merge_update, RegistrationRequest, UpdateRequest};
pub use validation::{
    validate_age, validate_email, validate_name, validate_password, CustomerValidationError,
};

#[cfg(test)]
pub use repository::MockCustomerRepository;
