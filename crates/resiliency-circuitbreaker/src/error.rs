use resiliency_core::ResiliencyError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the circuit breaker's pre-call gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError {
    /// The circuit is open; calls are not permitted.
    #[error("circuit breaker '{name}' is open; call not permitted")]
    OpenCircuit {
        name: String,
        /// Cool-down left before a probe is admitted.
        remaining: Option<Duration>,
    },
}

impl CircuitBreakerError {
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            CircuitBreakerError::OpenCircuit { remaining, .. } => *remaining,
        }
    }

    /// Converts into the decorator's error taxonomy.
    pub fn into_resiliency_error<E>(self) -> ResiliencyError<E> {
        match self {
            CircuitBreakerError::OpenCircuit { name, remaining } => {
                ResiliencyError::CircuitOpen { name, remaining }
            }
        }
    }
}
