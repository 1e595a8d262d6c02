//! Typed failures for the credit operations.
//!
//! Every failure mode here is a normal, expected return to the caller;
//! there is no fatal path inside the core. Store-level transient failures
//! surface through `Storage` without internal retries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("supervisor privileges required")]
    PermissionDenied,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("insufficient credits: requested {requested}, available {available}")]
    ResourceExhausted { requested: i64, available: i64 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CreditError {
    /// Stable machine-readable kind used in the wire error body
    pub fn kind(&self) -> &'static str {
        match self {
            CreditError::Unauthenticated => "unauthenticated",
            CreditError::PermissionDenied => "permission_denied",
            CreditError::InvalidArgument(_) => "invalid_argument",
            CreditError::NotFound(_) => "not_found",
            CreditError::ResourceExhausted { .. } => "resource_exhausted",
            CreditError::Storage(_) => "storage",
        }
    }
}
