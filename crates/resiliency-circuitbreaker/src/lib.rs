//! Consecutive-failure circuit breaker.
//!
//! A circuit breaker stops calling a failing dependency for a cool-down
//! period, then probes whether it has recovered.
//!
//! ## States
//! - **Closed**: calls pass; `failure_threshold` consecutive failures trip it.
//! - **Open**: calls are rejected. Once `recovery_timeout` has elapsed, the
//!   next status check moves it to HalfOpen. There is no background timer.
//! - **HalfOpen**: probe calls pass; `success_threshold` consecutive
//!   successes close it, any failure re-opens it.
//!
//! ## Usage
//!
//! ```rust
//! use resiliency_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::builder()
//!         .name("inventory")
//!         .failure_threshold(3)
//!         .recovery_timeout(Duration::from_secs(10))
//!         .build()
//!         .unwrap(),
//! );
//!
//! for _ in 0..3 {
//!     breaker.record_failure();
//! }
//! assert!(breaker.is_open());
//! assert!(breaker.check().is_err());
//! ```
//!
//! The breaker knows nothing about retries or bulkheads; the decorator in the
//! `resiliency` crate decides when to call [`CircuitBreaker::check`] and how to
//! report outcomes.
//!
//! ## Sharing
//!
//! `CircuitBreaker` is a cheap handle. Clones share one state machine, so a
//! breaker is created once per protected resource and handed to every caller.
//!
//! ## Feature Flags
//! - `metrics`: `circuitbreaker_*` counters and gauges via the `metrics` crate
//! - `tracing`: state transitions and rejections logged via `tracing`
//! - `serde`: `Serialize` for [`CircuitState`] and [`CircuitMetrics`]

use crate::circuit::Circuit;
#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
#[cfg(feature = "metrics")]
use std::sync::Once;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;

mod circuit;
mod config;
mod error;
mod events;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// A thread-safe circuit breaker handle.
#[derive(Clone)]
pub struct CircuitBreaker {
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "circuitbreaker_calls_total",
                "Calls seen by the circuit breaker, by outcome"
            );
            describe_counter!(
                "circuitbreaker_transitions_total",
                "Circuit breaker state transitions"
            );
            describe_gauge!(
                "circuitbreaker_state",
                "Current circuit breaker state (1 for the active state)"
            );
        });

        Self {
            circuit: Arc::new(Mutex::new(Circuit::new())),
            config: Arc::new(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state, promoting Open to HalfOpen once the
    /// recovery timeout has elapsed.
    pub fn state(&self) -> CircuitState {
        self.with_circuit(|circuit, config| circuit.refresh(config))
    }

    /// Returns whether calls are currently rejected.
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// The pre-call gate: admits the call or reports the remaining cool-down.
    ///
    /// Unlike [`is_open`](Self::is_open) this emits `CallPermitted` /
    /// `CallRejected` events.
    pub fn check(&self) -> Result<(), CircuitBreakerError> {
        let result = self.with_circuit(|circuit, config| circuit.try_acquire(config));

        #[cfg(feature = "tracing")]
        if let Err(CircuitBreakerError::OpenCircuit { remaining, .. }) = &result {
            tracing::debug!(breaker = %self.config.name, remaining = ?remaining, "circuit breaker rejected call");
        }

        result
    }

    /// Records a successful call and returns the resulting state.
    pub fn record_success(&self) -> CircuitState {
        self.with_circuit(|circuit, config| circuit.record_success(config))
    }

    /// Records a failed call and returns the resulting state.
    ///
    /// A return of [`CircuitState::Open`] tells the caller the circuit is
    /// open now, either because this failure tripped it or because another
    /// caller did.
    pub fn record_failure(&self) -> CircuitState {
        self.with_circuit(|circuit, config| circuit.record_failure(config))
    }

    /// Forces the circuit into the open state.
    pub fn force_open(&self) {
        self.with_circuit(|circuit, config| circuit.force_open(config));
    }

    /// Forces the circuit into the closed state.
    pub fn force_closed(&self) {
        self.with_circuit(|circuit, config| circuit.force_closed(config));
    }

    /// Resets the circuit to the closed state and clears counts.
    pub fn reset(&self) {
        self.with_circuit(|circuit, config| circuit.reset(config));
    }

    /// Returns a snapshot of the current counters.
    ///
    /// Does not apply the lazy HalfOpen promotion.
    pub fn metrics(&self) -> CircuitMetrics {
        self.lock().metrics(&self.config)
    }

    /// Runs `f` under the lock, then delivers the events it staged.
    ///
    /// Listeners run after the guard is dropped, so they may call back into
    /// this breaker. Events from concurrent callers can reach listeners in a
    /// different order than the transitions happened.
    fn with_circuit<R>(&self, f: impl FnOnce(&mut Circuit, &CircuitBreakerConfig) -> R) -> R {
        let (result, events) = {
            let mut circuit = self.lock();
            let result = f(&mut circuit, &self.config);
            (result, circuit.take_events())
        };
        self.config.listeners.emit_all(&events);
        result
    }

    // Listeners never run under the lock, so a poisoned lock only means a
    // panic elsewhere; the state machine itself is always consistent.
    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("state", &self.lock().state())
            .finish()
    }
}
