//! Events emitted by the decorator.
//!
//! Circuit state transitions are reported by the breaker's own listeners
//! (see `CircuitBreakerConfigBuilder::on_state_transition`); these events
//! cover admission and the attempt loop.

use resiliency_core::{ErrorKind, Event};
use std::time::{Duration, Instant};

/// Events emitted while executing a protected call.
///
/// Attempt indices are zero-based.
#[derive(Debug, Clone)]
pub enum DecoratorEvent {
    /// The call was refused before any attempt ran.
    CallRejected {
        decorator: String,
        timestamp: Instant,
        kind: ErrorKind,
    },
    AttemptSucceeded {
        decorator: String,
        timestamp: Instant,
        attempt: usize,
        duration: Duration,
    },
    /// The operation returned an ordinary failure.
    AttemptFailed {
        decorator: String,
        timestamp: Instant,
        attempt: usize,
        duration: Duration,
    },
    /// The attempt was dropped after running past the per-attempt timeout.
    AttemptTimedOut {
        decorator: String,
        timestamp: Instant,
        attempt: usize,
        timeout: Duration,
    },
    /// Another attempt will run after `delay`.
    RetryScheduled {
        decorator: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// Every attempt failed.
    RetriesExhausted {
        decorator: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The caller's token fired while the call was in progress.
    Cancelled {
        decorator: String,
        timestamp: Instant,
    },
}

impl Event for DecoratorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DecoratorEvent::CallRejected { .. } => "call_rejected",
            DecoratorEvent::AttemptSucceeded { .. } => "attempt_succeeded",
            DecoratorEvent::AttemptFailed { .. } => "attempt_failed",
            DecoratorEvent::AttemptTimedOut { .. } => "attempt_timed_out",
            DecoratorEvent::RetryScheduled { .. } => "retry_scheduled",
            DecoratorEvent::RetriesExhausted { .. } => "retries_exhausted",
            DecoratorEvent::Cancelled { .. } => "cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            DecoratorEvent::CallRejected { timestamp, .. }
            | DecoratorEvent::AttemptSucceeded { timestamp, .. }
            | DecoratorEvent::AttemptFailed { timestamp, .. }
            | DecoratorEvent::AttemptTimedOut { timestamp, .. }
            | DecoratorEvent::RetryScheduled { timestamp, .. }
            | DecoratorEvent::RetriesExhausted { timestamp, .. }
            | DecoratorEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            DecoratorEvent::CallRejected { decorator, .. }
            | DecoratorEvent::AttemptSucceeded { decorator, .. }
            | DecoratorEvent::AttemptFailed { decorator, .. }
            | DecoratorEvent::AttemptTimedOut { decorator, .. }
            | DecoratorEvent::RetryScheduled { decorator, .. }
            | DecoratorEvent::RetriesExhausted { decorator, .. }
            | DecoratorEvent::Cancelled { decorator, .. } => decorator,
        }
    }
}
