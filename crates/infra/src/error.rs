use thiserror::Error;

use stockroom_core::DomainError;

use crate::store::StoreError;

/// Error returned by the application services.
///
/// Domain failures and store failures are folded into the caller-facing kinds
/// here, so the transport layer maps one enum.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// Lost a race after all retries, or a referential rule refused the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Bad credentials, or a token whose session is gone.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::Store(_) => "store_error",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::InsufficientStock {
                requested,
                available,
            } => ServiceError::InsufficientStock {
                requested,
                available,
            },
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::Unauthorized => ServiceError::Unauthenticated("unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Conflict(msg) | StoreError::Restricted(msg) => ServiceError::Conflict(msg),
            StoreError::Duplicate(what) => ServiceError::Conflict(format!("{what} already exists")),
            StoreError::Constraint(msg) => ServiceError::InvalidArgument(msg),
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_fold_into_caller_kinds() {
        assert_eq!(
            ServiceError::from(StoreError::Restricted("in use".into())).code(),
            "conflict"
        );
        assert_eq!(
            ServiceError::from(StoreError::Duplicate("account".into())).code(),
            "conflict"
        );
        assert_eq!(
            ServiceError::from(StoreError::NotFound("product 9".into())).code(),
            "not_found"
        );
        assert_eq!(
            ServiceError::from(StoreError::Backend("disk".into())).code(),
            "store_error"
        );
    }

    #[test]
    fn insufficient_stock_keeps_its_numbers() {
        let err = ServiceError::from(DomainError::insufficient_stock(10, 6));
        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                requested: 10,
                available: 6
            }
        ));
    }
}
