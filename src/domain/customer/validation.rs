//! Customer validation utilities

use thiserror::Error;

/// Errors that can occur during customer validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CustomerValidationError {
    #[error("Customer ID must be an integer, got '{0}'")]
    InvalidId(String),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email must contain '@'")]
    InvalidEmail,

    #[error("Age must be a positive integer, got {0}")]
    InvalidAge(i32),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Unknown gender '{0}'. Expected MALE or FEMALE")]
    UnknownGender(String),
}

const MAX_NAME_LENGTH: usize = 255;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), CustomerValidationError> {
    if name.trim().is_empty() {
        return Err(CustomerValidationError::EmptyName);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CustomerValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validate an email address
///
/// Only the shape is checked. Case is preserved and compared exactly.
pub fn validate_email(email: &str) -> Result<(), CustomerValidationError> {
    if email.trim().is_empty() {
        return Err(CustomerValidationError::EmptyEmail);
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(CustomerValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !email.contains('@') {
        return Err(CustomerValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate an age
pub fn validate_age(age: i32) -> Result<(), CustomerValidationError> {
    if age <= 0 {
        return Err(CustomerValidationError::InvalidAge(age));
    }

    Ok(())
}

/// Validate a plaintext password before hashing
pub fn validate_password(password: &str) -> Result<(), CustomerValidationError> {
    if password.is_empty() {
        return Err(CustomerValidationError::EmptyPassword);
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(CustomerValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
