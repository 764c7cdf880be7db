//! Error taxonomy shared by every resiliency mechanism.
//!
//! [`ResiliencyError<E>`] is both the error returned by the decorator and the
//! error type a protected operation returns. Ordinary failures travel in the
//! [`ResiliencyError::Operation`] variant and are retried; every other variant
//! is a *structural* failure produced by a resiliency layer and is propagated
//! verbatim, including across nested decorators.
//!
//! Callers branch on [`ResiliencyError::kind`], never on the message text:
//!
//! ```
//! use resiliency_core::{ErrorKind, ResiliencyError};
//!
//! fn should_serve_stale(err: &ResiliencyError<std::io::Error>) -> bool {
//!     matches!(
//!         err.kind(),
//!         Some(ErrorKind::CircuitOpen) | Some(ErrorKind::BulkheadFull)
//!     )
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// The structural failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Every attempt failed.
    MaxRetriesExceeded,
    /// The circuit breaker rejected the call, or tripped during it.
    CircuitOpen,
    /// No bulkhead slot became free within the allowed wait.
    BulkheadFull,
    /// An attempt ran past its deadline.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MaxRetriesExceeded => "max_retries_exceeded",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::BulkheadFull => "bulkhead_full",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a protected call.
///
/// `E` is the operation's own error type.
#[derive(Debug, Clone)]
pub enum ResiliencyError<E> {
    /// The circuit breaker is open; the operation was not invoked, or the
    /// breaker tripped on this call's failure.
    CircuitOpen {
        /// Breaker name.
        name: String,
        /// Cool-down left before the breaker will admit a probe, if known.
        remaining: Option<Duration>,
    },

    /// The bulkhead had no free slot within its maximum wait.
    BulkheadFull {
        /// Bulkhead name.
        name: String,
        /// Configured capacity.
        max_concurrent_calls: usize,
    },

    /// An attempt did not complete within its timeout.
    Timeout {
        /// The per-attempt limit that was exceeded.
        timeout: Duration,
    },

    /// All attempts failed; `source` is the last operation error.
    MaxRetriesExceeded { attempts: usize, source: E },

    /// The caller's cancellation token fired.
    Cancelled,

    /// An ordinary failure returned by the protected operation.
    Operation(E),
}

impl<E> ResiliencyError<E> {
    /// The taxonomy kind, or `None` for cancellation and raw operation errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ResiliencyError::CircuitOpen { .. } => Some(ErrorKind::CircuitOpen),
            ResiliencyError::BulkheadFull { .. } => Some(ErrorKind::BulkheadFull),
            ResiliencyError::Timeout { .. } => Some(ErrorKind::Timeout),
            ResiliencyError::MaxRetriesExceeded { .. } => Some(ErrorKind::MaxRetriesExceeded),
            ResiliencyError::Cancelled | ResiliencyError::Operation(_) => None,
        }
    }

    /// Returns `true` for anything produced by a resiliency layer rather
    /// than by the operation. Structural failures are never retried.
    pub fn is_structural(&self) -> bool {
        !matches!(self, ResiliencyError::Operation(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResiliencyError::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ResiliencyError::Timeout { .. })
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResiliencyError::CircuitOpen { .. })
    }

    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, ResiliencyError::BulkheadFull { .. })
    }

    /// The operation error carried by this value, if any.
    ///
    /// Returns the wrapped cause for `MaxRetriesExceeded` and the raw error
    /// for `Operation`.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            ResiliencyError::Operation(e) => Some(e),
            ResiliencyError::MaxRetriesExceeded { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Borrowing form of [`into_operation_error`](Self::into_operation_error).
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            ResiliencyError::Operation(e) => Some(e),
            ResiliencyError::MaxRetriesExceeded { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Maps the operation error type, preserving the structural variant.
    ///
    /// ```
    /// use resiliency_core::ResiliencyError;
    ///
    /// let err: ResiliencyError<String> = ResiliencyError::Operation("boom".to_string());
    /// let mapped = err.map_operation(|s| s.len());
    /// assert_eq!(mapped.into_operation_error(), Some(4));
    /// ```
    pub fn map_operation<F, T>(self, f: F) -> ResiliencyError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResiliencyError::CircuitOpen { name, remaining } => {
                ResiliencyError::CircuitOpen { name, remaining }
            }
            ResiliencyError::BulkheadFull {
                name,
                max_concurrent_calls,
            } => ResiliencyError::BulkheadFull {
                name,
                max_concurrent_calls,
            },
            ResiliencyError::Timeout { timeout } => ResiliencyError::Timeout { timeout },
            ResiliencyError::MaxRetriesExceeded { attempts, source } => {
                ResiliencyError::MaxRetriesExceeded {
                    attempts,
                    source: f(source),
                }
            }
            ResiliencyError::Cancelled => ResiliencyError::Cancelled,
            ResiliencyError::Operation(e) => ResiliencyError::Operation(f(e)),
        }
    }
}

// Lets operations use `?` on their own error type. Leaf crates convert their
// errors with explicit methods since a second blanket `From` would overlap.
impl<E> From<E> for ResiliencyError<E> {
    fn from(err: E) -> Self {
        ResiliencyError::Operation(err)
    }
}

impl<E> fmt::Display for ResiliencyError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResiliencyError::CircuitOpen { name, remaining } => match remaining {
                Some(d) => write!(f, "circuit breaker '{}' is open (retry in {:?})", name, d),
                None => write!(f, "circuit breaker '{}' is open", name),
            },
            ResiliencyError::BulkheadFull {
                name,
                max_concurrent_calls,
            } => write!(
                f,
                "bulkhead '{}' is full: max concurrent calls ({}) reached",
                name, max_concurrent_calls
            ),
            ResiliencyError::Timeout { timeout } => {
                write!(f, "attempt timed out after {:?}", timeout)
            }
            ResiliencyError::MaxRetriesExceeded { attempts, source } => {
                write!(f, "gave up after {} attempts: {}", attempts, source)
            }
            ResiliencyError::Cancelled => f.write_str("call cancelled"),
            ResiliencyError::Operation(e) => write!(f, "operation failed: {}", e),
        }
    }
}

impl<E> std::error::Error for ResiliencyError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResiliencyError::MaxRetriesExceeded { source, .. } => Some(source),
            ResiliencyError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// A configuration builder rejected its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A count that must be at least one was zero.
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },

    /// The backoff multiplier was below one, NaN or infinite.
    #[error("backoff multiplier must be a finite value >= 1.0 (got {0})")]
    InvalidMultiplier(f64),

    /// The base delay exceeds the delay cap.
    #[error("base delay {base:?} exceeds max delay {max:?}")]
    DelayCapBelowBase { base: Duration, max: Duration },
}
