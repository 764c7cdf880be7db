//! Error types for the bulkhead.

use resiliency_core::ResiliencyError;

/// Errors that can occur when acquiring a bulkhead permit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkheadError {
    /// No permit became free within the maximum wait.
    #[error("bulkhead '{name}' is full: max concurrent calls ({max_concurrent_calls}) reached")]
    Full {
        name: String,
        max_concurrent_calls: usize,
    },
    /// The caller's cancellation token fired while waiting.
    #[error("cancelled while waiting for a bulkhead permit")]
    Cancelled,
}

/// Result type for bulkhead operations.
pub type Result<T> = std::result::Result<T, BulkheadError>;

impl BulkheadError {
    /// Converts into the decorator's error taxonomy.
    pub fn into_resiliency_error<E>(self) -> ResiliencyError<E> {
        match self {
            BulkheadError::Full {
                name,
                max_concurrent_calls,
            } => ResiliencyError::BulkheadFull {
                name,
                max_concurrent_calls,
            },
            BulkheadError::Cancelled => ResiliencyError::Cancelled,
        }
    }
}
