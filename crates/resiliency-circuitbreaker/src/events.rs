use crate::CircuitState;
use resiliency_core::Event;
use std::time::{Duration, Instant};

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The pre-call gate admitted a call.
    CallPermitted {
        breaker: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// The pre-call gate rejected a call because the circuit is open.
    CallRejected {
        breaker: String,
        timestamp: Instant,
        remaining: Option<Duration>,
    },
    /// The circuit moved between states.
    StateTransition {
        breaker: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A success was counted.
    SuccessRecorded {
        breaker: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failure was counted.
    FailureRecorded {
        breaker: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl Event for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CircuitBreakerEvent::CallPermitted { breaker, .. }
            | CircuitBreakerEvent::CallRejected { breaker, .. }
            | CircuitBreakerEvent::StateTransition { breaker, .. }
            | CircuitBreakerEvent::SuccessRecorded { breaker, .. }
            | CircuitBreakerEvent::FailureRecorded { breaker, .. } => breaker,
        }
    }
}
