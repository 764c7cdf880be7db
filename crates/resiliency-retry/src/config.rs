use crate::backoff::Backoff;
use resiliency_core::ConfigError;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Retry policy for one logical call.
///
/// A plain record with no mutable state; each call of the decorator walks
/// its own attempt counter against it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RetryConfigFields")
)]
pub struct RetryConfig {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl RetryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// The backoff calculator for this policy.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.base_delay, self.max_delay, self.multiplier).with_jitter(self.jitter)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroCount {
                field: "max_attempts",
            });
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.multiplier));
        }
        if self.base_delay > self.max_delay {
            return Err(ConfigError::DelayCapBelowBase {
                base: self.base_delay,
                max: self.max_delay,
            });
        }
        Ok(self)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: false,
        }
    }
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: RetryConfig::default(),
        }
    }

    /// Sets the total number of attempts, the first call included.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Sets the delay after the first failed attempt.
    ///
    /// Default: 100ms
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Sets the upper bound on any single delay, before jitter.
    ///
    /// Default: 10s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Sets the exponential growth factor. Must be finite and at least 1.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.config.multiplier = multiplier;
        self
    }

    /// Enables the ±10% randomized perturbation of each delay.
    ///
    /// Default: false
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        self.config.validate()
    }
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape of [`RetryConfig`]. Missing fields take the builder defaults.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RetryConfigFields {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

#[cfg(feature = "serde")]
impl Default for RetryConfigFields {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay: defaults.base_delay,
            max_delay: defaults.max_delay,
            multiplier: defaults.multiplier,
            jitter: defaults.jitter,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RetryConfigFields> for RetryConfig {
    type Error = ConfigError;

    fn try_from(fields: RetryConfigFields) -> Result<Self, Self::Error> {
        RetryConfig {
            max_attempts: fields.max_attempts,
            base_delay: fields.base_delay,
            max_delay: fields.max_delay,
            multiplier: fields.multiplier,
            jitter: fields.jitter,
        }
        .validate()
    }
}
