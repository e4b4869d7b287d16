//! Registration and update requests, and the partial-update merge

use serde::Deserialize;

use super::entity::{Customer, Gender};
use super::validation::{
    validate_age, validate_email, validate_name, validate_password, CustomerValidationError,
};

/// Request for registering a new customer
#[derive(Clone, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: i32,
    pub gender: Gender,
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_age(self.age)
    }
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[hidden]")
            .field("age", &self.age)
            .field("gender", &self.gender)
            .finish()
    }
}

/// Request for a partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl UpdateRequest {
    /// Validate only the fields that are present
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }

        if let Some(email) = &self.email {
            validate_email(email)?;
        }

        if let Some(age) = self.age {
            validate_age(age)?;
        }

        Ok(())
    }
}

/// Merge an update into the current record.
///
/// Fields are evaluated name, age, email, gender. A field is staged only if it
/// is present and differs from the stored value. Returns `None` when nothing
/// would change.
pub fn merge_update(current: &Customer, request: &UpdateRequest) -> Option<Customer> {
    let mut merged = current.clone();
    let mut changed = false;

    if let Some(name) = request.name.as_deref().filter(|n| *n != current.name()) {
        merged.set_name(name);
        changed = true;
    }

    if let Some(age) = request.age.filter(|a| *a != current.age()) {
        merged.set_age(age);
        changed = true;
    }

    if let Some(email) = request.email.as_deref().filter(|e| *e != current.email()) {
        merged.set_email(email);
        changed = true;
    }

    if let Some(gender) = request.gender.filter(|g| *g != current.gender()) {
        merged.set_gender(gender);
        changed = true;
    }

    changed.then_some(merged)
}
