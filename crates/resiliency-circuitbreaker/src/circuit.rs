use crate::config::CircuitBreakerConfig;
use crate::error::CircuitBreakerError;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CircuitState {
    /// Calls flow through; consecutive failures are counted.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// Probe calls are allowed; consecutive successes are counted.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

/// Point-in-time view of a breaker's internals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitMetrics {
    pub state: CircuitState,
    /// Consecutive failures counted while Closed.
    pub failure_count: usize,
    /// Consecutive successes counted while HalfOpen.
    pub success_count: usize,
    /// Time spent in the current state.
    pub time_since_state_change: Duration,
    /// Cool-down left while Open.
    pub remaining_open: Option<Duration>,
}

/// The lock-protected state machine behind a [`CircuitBreaker`](crate::CircuitBreaker).
///
/// Every method takes `&mut self`; the handle serialises access with a single
/// mutex so transitions are linearizable. Events are staged in `pending` and
/// handed to listeners by the handle once the lock is released.
#[derive(Debug)]
pub(crate) struct Circuit {
    state: CircuitState,
    failure_count: usize,
    success_count: usize,
    opened_at: Option<Instant>,
    last_state_change: Instant,
    pending: Vec<CircuitBreakerEvent>,
}

impl Circuit {
    pub(crate) fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            opened_at: None,
            last_state_change: Instant::now(),
            pending: Vec::new(),
        }
    }

    /// Drains the events staged since the last call.
    pub(crate) fn take_events(&mut self) -> Vec<CircuitBreakerEvent> {
        std::mem::take(&mut self.pending)
    }

    fn stage(&mut self, config: &CircuitBreakerConfig, event: CircuitBreakerEvent) {
        if !config.listeners.is_empty() {
            self.pending.push(event);
        }
    }

    /// Current state after applying the lazy Open -> HalfOpen promotion.
    pub(crate) fn refresh(&mut self, config: &CircuitBreakerConfig) -> CircuitState {
        if self.state == CircuitState::Open && self.remaining_open(config).is_none() {
            self.transition_to(CircuitState::HalfOpen, config);
        }
        self.state
    }

    /// Cool-down left while Open, `None` once it has elapsed or when not Open.
    pub(crate) fn remaining_open(&self, config: &CircuitBreakerConfig) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        let opened_at = self.opened_at?;
        config
            .recovery_timeout
            .checked_sub(opened_at.elapsed())
            .filter(|left| !left.is_zero())
    }

    /// The pre-call gate.
    pub(crate) fn try_acquire(
        &mut self,
        config: &CircuitBreakerConfig,
    ) -> Result<(), CircuitBreakerError> {
        match self.refresh(config) {
            CircuitState::Open => {
                let remaining = self.remaining_open(config);
                self.stage(config, CircuitBreakerEvent::CallRejected {
                    breaker: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    remaining,
                });

                #[cfg(feature = "metrics")]
                counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected").increment(1);

                Err(CircuitBreakerError::OpenCircuit {
                    name: config.name.clone(),
                    remaining,
                })
            }
            state => {
                self.stage(config, CircuitBreakerEvent::CallPermitted {
                    breaker: config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    state,
                });
                Ok(())
            }
        }
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) -> CircuitState {
        match self.state {
            // Outcome of a call admitted before the trip.
            CircuitState::Open => return self.state,
            CircuitState::Closed => {
                self.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                self.success_count += 1;
            }
        }

        self.stage(config, CircuitBreakerEvent::SuccessRecorded {
            breaker: config.name.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success").increment(1);

        if self.state == CircuitState::HalfOpen && self.success_count >= config.success_threshold {
            self.transition_to(CircuitState::Closed, config);
        }
        self.state
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) -> CircuitState {
        match self.state {
            CircuitState::Open => return self.state,
            CircuitState::Closed => {
                self.failure_count += 1;
            }
            CircuitState::HalfOpen => {}
        }

        self.stage(config, CircuitBreakerEvent::FailureRecorded {
            breaker: config.name.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure").increment(1);

        match self.state {
            // A single failed probe re-opens the circuit.
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            CircuitState::Closed if self.failure_count >= config.failure_threshold => {
                self.transition_to(CircuitState::Open, config)
            }
            _ => {}
        }
        self.state
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Open, config);
    }

    pub(crate) fn force_closed(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    /// Back to Closed with cleared counters, even when already Closed.
    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.failure_count = 0;
        self.success_count = 0;
    }

    pub(crate) fn metrics(&self, config: &CircuitBreakerConfig) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            failure_count: self.failure_count,
            success_count: self.success_count,
            time_since_state_change: self.last_state_change.elapsed(),
            remaining_open: self.remaining_open(config),
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        self.stage(config, CircuitBreakerEvent::StateTransition {
            breaker: config.name.clone(),
            timestamp: std::time::Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %config.name, from = ?from_state, to = ?state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone(), "state" => from_state.as_str())
                .set(0.0);
            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone(), "state" => state.as_str())
                .set(1.0);
        }

        let now = Instant::now();
        self.state = state;
        self.last_state_change = now;
        self.opened_at = (state == CircuitState::Open).then_some(now);
        self.failure_count = 0;
        self.success_count = 0;
    }
}
