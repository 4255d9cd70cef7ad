//! Errors raised by domain rules.

use thiserror::Error;

/// A rejected value or a failed password operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input breaks a field or lifecycle rule; the message names the field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password too short or otherwise unusable
    #[error("Password error: {0}")]
    Password(String),

    /// Hashing backend failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
