use thiserror::Error;

use crate::domain::Entity;
use crate::store::StoreError;

/// Errors returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input; the caller can fix it.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(Entity),

    /// The request is well formed but clashes with current state.
    #[error("{0}")]
    Conflict(String),

    /// The store failed or timed out. Safe to retry.
    #[error("{0}")]
    Dependency(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::Duplicate(constraint) => Self::Conflict(format!("duplicate record ({})", constraint)),
            StoreError::Timeout => Self::Dependency("store operation timed out".to_string()),
            StoreError::Database(message) => Self::Dependency(message),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
