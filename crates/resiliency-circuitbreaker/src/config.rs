use crate::events::CircuitBreakerEvent;
use crate::CircuitState;
use resiliency_core::{ConfigError, FnListener, Listeners};
use std::time::Duration;

/// Configuration for a [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: usize,
    pub(crate) success_threshold: usize,
    pub(crate) recovery_timeout: Duration,
    pub(crate) name: String,
    pub(crate) listeners: Listeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Consecutive failures in Closed that trip the breaker.
    pub fn failure_threshold(&self) -> usize {
        self.failure_threshold
    }

    /// Consecutive successes in HalfOpen that close the breaker.
    pub fn success_threshold(&self) -> usize {
        self.success_threshold
    }

    /// How long the breaker stays Open before admitting a probe.
    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfigBuilder::new().assemble()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: usize,
    success_threshold: usize,
    recovery_timeout: Duration,
    name: String,
    listeners: Listeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            recovery_timeout: Duration::from_secs(30),
            name: String::from("<unnamed>"),
            listeners: Listeners::new(),
        }
    }

    /// Sets how many consecutive failures open the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, n: usize) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Sets how many consecutive half-open successes close the circuit.
    ///
    /// Default: 1
    pub fn success_threshold(mut self, n: usize) -> Self {
        self.success_threshold = n;
        self
    }

    /// Sets how long the circuit stays open before a probe is allowed.
    ///
    /// Default: 30 seconds
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Sets the name used in events, logs and metric labels.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for every state transition.
    ///
    /// This is the hook a metrics or alerting system uses to observe the
    /// breaker; the breaker itself never exports anything.
    ///
    /// # Example
    /// ```rust
    /// use resiliency_circuitbreaker::CircuitBreakerConfig;
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .failure_threshold(3)
    ///     .on_state_transition(|from, to| {
    ///         println!("breaker moved {:?} -> {:?}", from, to);
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback when the gate rejects a call.
    ///
    /// The callback receives the remaining cool-down, if known.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Duration>) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallRejected { remaining, .. } = event {
                f(*remaining);
            }
        }));
        self
    }

    /// Registers a callback when the gate admits a call.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Registers a callback for every counted success and failure.
    ///
    /// The callback receives `true` for a failure and the state the outcome
    /// was counted in.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(bool, CircuitState) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event| match event {
            CircuitBreakerEvent::SuccessRecorded { state, .. } => f(false, *state),
            CircuitBreakerEvent::FailureRecorded { state, .. } => f(true, *state),
            _ => {}
        }));
        self
    }

    /// Registers a raw event listener.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<CircuitBreakerConfig, ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroCount {
                field: "failure_threshold",
            });
        }
        if self.success_threshold == 0 {
            return Err(ConfigError::ZeroCount {
                field: "success_threshold",
            });
        }

        Ok(self.assemble())
    }

    fn assemble(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            recovery_timeout: self.recovery_timeout,
            name: self.name,
            listeners: self.listeners,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
