//! Retry policy and exponential backoff.
//!
//! [`RetryConfig`] describes how many times a call is attempted and how long
//! to wait between attempts; [`Backoff`] turns an attempt index into a delay.
//! The retry loop itself lives in the `resiliency` decorator, which also
//! decides which failures are retried.
//!
//! ```rust
//! use resiliency_retry::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig::builder()
//!     .max_attempts(4)
//!     .base_delay(Duration::from_millis(50))
//!     .max_delay(Duration::from_secs(1))
//!     .build()
//!     .unwrap();
//!
//! let backoff = config.backoff();
//! assert_eq!(backoff.delay(0), Duration::from_millis(50));
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! ```
//!
//! ## Feature Flags
//! - `serde`: `Serialize`/`Deserialize` for [`RetryConfig`]; deserialized
//!   configs are validated like built ones

mod backoff;
mod config;

pub use backoff::Backoff;
pub use config::{RetryConfig, RetryConfigBuilder};
