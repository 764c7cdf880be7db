use rand::Rng;
use std::time::Duration;

/// Lower and upper bounds of the jitter factor.
const JITTER_MIN: f64 = 0.9;
const JITTER_MAX: f64 = 1.1;

/// Exponential backoff capped at a maximum delay.
///
/// `delay(attempt) = min(base_delay * multiplier^attempt, max_delay)` with a
/// zero-based `attempt`. With jitter enabled the capped delay is scaled by a
/// uniform factor in `[0.9, 1.1]`, drawn independently on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Backoff {
    /// Creates a backoff without jitter.
    pub fn new(base_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            max_delay,
            multiplier,
            jitter: false,
        }
    }

    /// Enables or disables the ±10% jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
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

    /// The delay to sleep after the failed attempt `attempt`.
    pub fn delay(&self, attempt: usize) -> Duration {
        let delay = self.capped_delay(attempt);
        if self.jitter {
            apply_jitter(delay)
        } else {
            delay
        }
    }

    /// The delay before jitter is applied. Never exceeds `max_delay`.
    pub fn capped_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);

        // Infinite or NaN products saturate to the cap.
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let factor = rand::rng().random_range(JITTER_MIN..=JITTER_MAX);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
}
