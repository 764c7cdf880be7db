//! Semaphore bulkhead.
//!
//! A bulkhead caps how many calls may run against a resource at once. Callers
//! beyond the cap wait for a free slot, up to an optional maximum wait, and
//! give up early if their cancellation token fires.
//!
//! Admission hands out a [`BulkheadPermit`]. The slot is returned when the
//! permit is dropped or explicitly [released](BulkheadPermit::release), on
//! every exit path including cancellation and panics.
//!
//! ## Usage
//!
//! ```rust
//! use resiliency_bulkhead::{Bulkhead, BulkheadConfig};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), resiliency_bulkhead::BulkheadError> {
//! let bulkhead = Bulkhead::new(
//!     BulkheadConfig::builder()
//!         .name("database")
//!         .max_concurrent_calls(10)
//!         .max_wait_duration(Some(Duration::from_millis(50)))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let token = CancellationToken::new();
//! let permit = bulkhead.acquire(&token).await?;
//! // ... talk to the database ...
//! permit.release();
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//! - `metrics`: `bulkhead_*` counters and the `bulkhead_concurrent_calls` gauge
//! - `tracing`: admissions and rejections logged via `tracing`

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::{BulkheadError, Result};
pub use events::BulkheadEvent;

mod config;
mod error;
mod events;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A bounded-concurrency gate. Clones share the same permits.
#[derive(Clone)]
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    config: Arc<BulkheadConfig>,
}

impl Bulkhead {
    pub fn new(config: BulkheadConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "bulkhead_calls_permitted_total",
                "Calls admitted by the bulkhead"
            );
            describe_counter!(
                "bulkhead_calls_rejected_total",
                "Calls that gave up waiting for a bulkhead permit"
            );
            describe_counter!(
                "bulkhead_calls_finished_total",
                "Bulkhead permits returned"
            );
            describe_gauge!(
                "bulkhead_concurrent_calls",
                "Calls currently holding a bulkhead permit"
            );
        });

        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            config: Arc::new(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BulkheadConfig {
        &self.config
    }

    pub fn max_concurrent_calls(&self) -> usize {
        self.config.max_concurrent_calls
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of permits currently held.
    pub fn concurrent_calls(&self) -> usize {
        self.config
            .max_concurrent_calls
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Acquires a permit, waiting at most the configured maximum wait.
    pub async fn acquire(&self, token: &CancellationToken) -> Result<BulkheadPermit> {
        self.acquire_timeout(token, self.config.max_wait_duration)
            .await
    }

    /// Acquires a permit with an explicit maximum wait.
    ///
    /// `None` waits until a permit frees up or the token fires. A zero wait
    /// only succeeds if a permit is free right now. Cancellation wins over a
    /// permit that becomes free at the same moment.
    pub async fn acquire_timeout(
        &self,
        token: &CancellationToken,
        max_wait: Option<Duration>,
    ) -> Result<BulkheadPermit> {
        if token.is_cancelled() {
            return Err(BulkheadError::Cancelled);
        }

        let semaphore = Arc::clone(&self.semaphore);
        let permit = match max_wait {
            Some(wait) if wait.is_zero() => semaphore.try_acquire_owned().ok(),
            Some(wait) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(BulkheadError::Cancelled),
                acquired = tokio::time::timeout(wait, semaphore.acquire_owned()) => {
                    acquired.ok().and_then(|res| res.ok())
                }
            },
            None => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(BulkheadError::Cancelled),
                acquired = semaphore.acquire_owned() => acquired.ok(),
            },
        };

        match permit {
            Some(permit) => Ok(self.admit(permit)),
            None => Err(self.reject()),
        }
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> BulkheadPermit {
        let concurrent_calls = self.concurrent_calls();
        self.config.listeners.emit(&BulkheadEvent::CallPermitted {
            bulkhead: self.config.name.clone(),
            timestamp: Instant::now(),
            concurrent_calls,
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(bulkhead = %self.config.name, concurrent_calls, "bulkhead permit acquired");

        #[cfg(feature = "metrics")]
        {
            counter!("bulkhead_calls_permitted_total", "bulkhead" => self.config.name.clone())
                .increment(1);
            gauge!("bulkhead_concurrent_calls", "bulkhead" => self.config.name.clone())
                .set(concurrent_calls as f64);
        }

        BulkheadPermit {
            permit: Some(permit),
            #[cfg(feature = "metrics")]
            semaphore: Arc::clone(&self.semaphore),
            config: Arc::clone(&self.config),
            acquired_at: Instant::now(),
        }
    }

    fn reject(&self) -> BulkheadError {
        self.config.listeners.emit(&BulkheadEvent::CallRejected {
            bulkhead: self.config.name.clone(),
            timestamp: Instant::now(),
            max_concurrent_calls: self.config.max_concurrent_calls,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            bulkhead = %self.config.name,
            max_concurrent_calls = self.config.max_concurrent_calls,
            "bulkhead full, call rejected"
        );

        #[cfg(feature = "metrics")]
        counter!("bulkhead_calls_rejected_total", "bulkhead" => self.config.name.clone())
            .increment(1);

        BulkheadError::Full {
            name: self.config.name.clone(),
            max_concurrent_calls: self.config.max_concurrent_calls,
        }
    }
}

impl std::fmt::Debug for Bulkhead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bulkhead")
            .field("name", &self.config.name)
            .field("max_concurrent_calls", &self.config.max_concurrent_calls)
            .field("available_permits", &self.semaphore.available_permits())
            .finish()
    }
}

/// An occupied bulkhead slot. Returned to the bulkhead on drop.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct BulkheadPermit {
    permit: Option<OwnedSemaphorePermit>,
    #[cfg(feature = "metrics")]
    semaphore: Arc<Semaphore>,
    config: Arc<BulkheadConfig>,
    acquired_at: Instant,
}

impl BulkheadPermit {
    /// Returns the slot now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }

    /// How long this permit has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Drop for BulkheadPermit {
    fn drop(&mut self) {
        // Give the slot back before notifying anyone.
        drop(self.permit.take());

        self.config.listeners.emit(&BulkheadEvent::CallFinished {
            bulkhead: self.config.name.clone(),
            timestamp: Instant::now(),
            duration: self.acquired_at.elapsed(),
        });

        #[cfg(feature = "metrics")]
        {
            let concurrent = self
                .config
                .max_concurrent_calls
                .saturating_sub(self.semaphore.available_permits());
            counter!("bulkhead_calls_finished_total", "bulkhead" => self.config.name.clone())
                .increment(1);
            gauge!("bulkhead_concurrent_calls", "bulkhead" => self.config.name.clone())
                .set(concurrent as f64);
        }
    }
}

impl std::fmt::Debug for BulkheadPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkheadPermit")
            .field("bulkhead", &self.config.name)
            .field("held_for", &self.acquired_at.elapsed())
            .finish()
    }
}
