//! Shared building blocks for the resiliency decorator.
//!
//! Every mechanism crate (circuit breaker, bulkhead, retry) and the decorator
//! itself depend on this crate for:
//! - the event system used for observability hooks
//! - [`ResiliencyError`], the error taxonomy callers branch on
//! - [`ConfigError`], returned by every configuration builder

pub mod error;
pub mod events;

pub use error::{ConfigError, ErrorKind, ResiliencyError};
pub use events::{Event, FnListener, Listener, Listeners};
