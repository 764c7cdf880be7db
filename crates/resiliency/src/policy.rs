use resiliency_bulkhead::BulkheadConfig;
use resiliency_circuitbreaker::CircuitBreakerConfig;
use resiliency_retry::RetryConfig;
use std::time::Duration;

/// Which mechanisms protect a call, and how.
///
/// Every mechanism is optional; an absent one is simply skipped. Without a
/// retry policy each call gets exactly one attempt.
///
/// ```rust
/// use resiliency::{ResiliencyPolicy, RetryConfig};
/// use std::time::Duration;
///
/// let policy = ResiliencyPolicy::new()
///     .with_name("inventory")
///     .with_retry(RetryConfig::builder().max_attempts(5).build().unwrap())
///     .with_timeout(Duration::from_millis(250));
///
/// assert!(policy.circuit_breaker.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ResiliencyPolicy {
    /// Labels events, logs and metrics.
    pub name: String,
    pub retry: Option<RetryConfig>,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    pub bulkhead: Option<BulkheadConfig>,
    /// Per-attempt limit. Does not bound the whole call.
    pub timeout: Option<Duration>,
}

impl ResiliencyPolicy {
    /// A policy with every mechanism disabled.
    pub fn new() -> Self {
        Self {
            name: "resiliency".to_string(),
            retry: None,
            circuit_breaker: None,
            bulkhead: None,
            timeout: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Some(config);
        self
    }

    pub fn with_bulkhead(mut self, config: BulkheadConfig) -> Self {
        self.bulkhead = Some(config);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attempts per call: the retry policy's `max_attempts`, or 1.
    pub fn max_attempts(&self) -> usize {
        self.retry.map_or(1, |retry| retry.max_attempts())
    }
}

impl Default for ResiliencyPolicy {
    fn default() -> Self {
        Self::new()
    }
}
