use service_core::error::AppError;
use thiserror::Error;

use crate::models::InvalidField;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("We couldn't find the existing {entity} ({key})")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid record: {0}")]
    Invalid(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation ended before producing a result")]
    Cancelled,
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<InvalidField> for StoreError {
    fn from(err: InvalidField) -> Self {
        StoreError::Invalid(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(anyhow::Error::new(err)),
            StoreError::Conflict(_) => AppError::Conflict(anyhow::Error::new(err)),
            StoreError::Invalid(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            StoreError::Unavailable(_) | StoreError::Cancelled => {
                AppError::Upstream(anyhow::Error::new(err))
            }
        }
    }
}
