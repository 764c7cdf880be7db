//! Composable resiliency for async operations.
//!
//! A [`ResiliencyDecorator`] wraps an arbitrary async closure with any subset
//! of four mechanisms:
//!
//! - **Circuit breaker**: stops calling a dependency that keeps failing
//! - **Bulkhead**: caps how many calls run at once
//! - **Retry**: re-runs failed attempts with exponential backoff
//! - **Timeout**: bounds each individual attempt
//!
//! They always apply in the same order: circuit check, then bulkhead
//! admission, then the retry loop with the timeout around each attempt. A
//! call rejected by the breaker never touches the bulkhead, and a call holds
//! one bulkhead slot for all of its attempts.
//!
//! ## Example
//!
//! ```rust
//! use resiliency::{
//!     BulkheadConfig, CircuitBreakerConfig, ResiliencyDecorator, ResiliencyError,
//!     ResiliencyPolicy, RetryConfig,
//! };
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn fetch_price(_sku: &str) -> Result<u64, std::io::Error> { Ok(42) }
//! # async fn example() -> Result<(), ResiliencyError<std::io::Error>> {
//! let policy = ResiliencyPolicy::new()
//!     .with_name("pricing")
//!     .with_retry(
//!         RetryConfig::builder()
//!             .max_attempts(3)
//!             .base_delay(Duration::from_millis(50))
//!             .jitter(true)
//!             .build()
//!             .unwrap(),
//!     )
//!     .with_circuit_breaker(
//!         CircuitBreakerConfig::builder()
//!             .failure_threshold(5)
//!             .recovery_timeout(Duration::from_secs(30))
//!             .build()
//!             .unwrap(),
//!     )
//!     .with_bulkhead(
//!         BulkheadConfig::builder()
//!             .max_concurrent_calls(16)
//!             .max_wait_duration(Some(Duration::from_millis(100)))
//!             .build()
//!             .unwrap(),
//!     )
//!     .with_timeout(Duration::from_millis(500));
//!
//! let decorator = ResiliencyDecorator::new(policy);
//! let token = CancellationToken::new();
//!
//! let price = decorator
//!     .execute(&token, || async {
//!         Ok::<_, ResiliencyError<std::io::Error>>(fetch_price("sku-1").await?)
//!     })
//!     .await?;
//! # let _ = price;
//! # Ok(())
//! # }
//! ```
//!
//! The operation returns `Result<T, ResiliencyError<E>>`; `?` on the
//! operation's own error wraps it as [`ResiliencyError::Operation`], the only
//! variant that is retried. Errors from a nested decorator keep their kind.
//!
//! ## Errors
//!
//! Branch on [`ResiliencyError::kind`]:
//!
//! | kind | meaning |
//! |---|---|
//! | `circuit_open` | breaker open, or tripped by this call's failure |
//! | `bulkhead_full` | no slot within the maximum wait |
//! | `timeout` | the last attempt ran past the per-attempt timeout |
//! | `max_retries_exceeded` | every attempt failed; the source is the last error |
//!
//! Cancellation surfaces as [`ResiliencyError::Cancelled`] and takes priority
//! over everything else.
//!
//! ## Feature Flags
//! - `metrics`: `resiliency_*` counters, plus breaker and bulkhead metrics
//! - `tracing`: attempt, retry and rejection logs
//! - `serde`: serialization for [`CircuitState`], [`CircuitMetrics`] and [`RetryConfig`]

mod decorator;
mod events;
mod layer;
mod policy;

pub use decorator::{execute, ResiliencyDecorator};
pub use events::DecoratorEvent;
pub use layer::{Resilient, ResiliencyLayer};
pub use policy::ResiliencyPolicy;

pub use resiliency_bulkhead::{
    Bulkhead, BulkheadConfig, BulkheadConfigBuilder, BulkheadError, BulkheadEvent, BulkheadPermit,
};
pub use resiliency_circuitbreaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerError,
    CircuitBreakerEvent, CircuitMetrics, CircuitState,
};
pub use resiliency_core::{ConfigError, ErrorKind, Event, Listener, ResiliencyError};
pub use resiliency_retry::{Backoff, RetryConfig, RetryConfigBuilder};
