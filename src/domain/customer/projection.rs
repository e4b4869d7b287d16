//! Externally visible view of a customer

use serde::{Deserialize, Serialize};

use super::entity::{Customer, CustomerId, Gender};

/// Role granted to every registered customer
pub const DEFAULT_ROLE: &str = "ROLE_USER";

/// Customer as exposed to API callers. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CustomerId>,
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub age: i32,
    pub roles: Vec<String>,
    pub username: String,
}

// Roles are not stored per customer; every projection carries the default role.
impl From<&Customer> for CustomerProjection {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id(),
            name: customer.name().to_string(),
            email: customer.email().to_string(),
            gender: customer.gender(),
            age: customer.age(),
            roles: vec![DEFAULT_ROLE.to_string()],
            username: customer.email().to_string(),
        }
    }
}

impl From<Customer> for CustomerProjection {
    fn from(customer: Customer) -> Self {
        Self::from(&customer)
    }
}
