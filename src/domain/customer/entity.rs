//! Customer entity and related types

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::CustomerValidationError;

/// Customer identifier - assigned by the storage backend on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(i32);

impl CustomerId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the inner integer value
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl FromStr for CustomerId {
    type Err = CustomerValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| CustomerValidationError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gender of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = CustomerValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            other => Err(CustomerValidationError::UnknownGender(other.to_string())),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = CustomerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored customer record
///
/// The password hash is kept here and nowhere else; it never reaches
/// [`super::CustomerProjection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: Option<CustomerId>,
    name: String,
    email: String,
    password_hash: String,
    age: i32,
    gender: Gender,
}

impl Customer {
    /// Create a customer that has not been stored yet
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        age: i32,
        gender: Gender,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            age,
            gender,
        }
    }

    /// Attach the identity assigned by a storage backend
    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.id = Some(id);
        self
    }

    // Getters

    pub fn id(&self) -> Option<CustomerId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = age;
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = gender;
    }
}
