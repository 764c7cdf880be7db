//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - Exactly N consecutive failures open the circuit, N-1 do not
//! - A success anywhere in the streak restarts the count
//! - Exactly M successes in HalfOpen close the circuit

use proptest::prelude::*;
use resiliency_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::time::Duration;

fn breaker(failures: usize, successes: usize) -> CircuitBreaker {
    CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .failure_threshold(failures)
            .success_threshold(successes)
            .recovery_timeout(Duration::ZERO)
            .build()
            .unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: the failure threshold is exact
    #[test]
    fn failure_threshold_is_exact(threshold in 1usize..=50) {
        let breaker = CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(threshold)
                .recovery_timeout(Duration::from_secs(3600))
                .build()
                .unwrap(),
        );

        for _ in 0..threshold - 1 {
            breaker.record_failure();
        }
        prop_assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        prop_assert_eq!(breaker.state(), CircuitState::Open);
    }

    /// Property: the circuit opens iff some run of consecutive failures
    /// reaches the threshold
    #[test]
    fn opens_only_on_a_long_enough_streak(
        threshold in 1usize..=8,
        outcomes in prop::collection::vec(any::<bool>(), 0..64),
    ) {
        let breaker = CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(threshold)
                .recovery_timeout(Duration::from_secs(3600))
                .build()
                .unwrap(),
        );

        let mut streak = 0;
        let mut expect_open = false;
        for success in outcomes {
            if success {
                breaker.record_success();
                streak = 0;
            } else {
                breaker.record_failure();
                streak += 1;
            }
            if streak >= threshold {
                expect_open = true;
            }
        }

        prop_assert_eq!(breaker.is_open(), expect_open);
    }

    /// Property: the success threshold in HalfOpen is exact
    #[test]
    fn success_threshold_is_exact(successes in 1usize..=20) {
        // A zero recovery timeout promotes to HalfOpen on the next check.
        let breaker = breaker(1, successes);
        breaker.record_failure();
        prop_assert_eq!(breaker.state(), CircuitState::HalfOpen);

        for _ in 0..successes - 1 {
            prop_assert_eq!(breaker.record_success(), CircuitState::HalfOpen);
        }
        prop_assert_eq!(breaker.record_success(), CircuitState::Closed);
    }

    /// Property: a failure at any point of the half-open sequence re-opens
    #[test]
    fn half_open_failure_reopens(successes in 2usize..=20, fail_at in 0usize..20) {
        let fail_at = fail_at % successes;
        let breaker = breaker(1, successes);
        breaker.record_failure();
        prop_assert_eq!(breaker.state(), CircuitState::HalfOpen);

        for _ in 0..fail_at {
            breaker.record_success();
        }
        prop_assert_eq!(breaker.record_failure(), CircuitState::Open);
        prop_assert_eq!(breaker.metrics().success_count, 0);
    }
}
