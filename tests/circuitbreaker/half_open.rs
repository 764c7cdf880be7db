//! Half-open state tests. Time is paused and advanced by hand.

use super::breaker;
use resiliency_circuitbreaker::{CircuitBreakerConfig, CircuitBreaker, CircuitState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn open_until_recovery_timeout_elapses() {
    let breaker = breaker(1, 1, Duration::from_millis(500));
    breaker.record_failure();

    tokio::time::advance(Duration::from_millis(499)).await;
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(breaker.check().is_err());

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
}

#[tokio::test(start_paused = true)]
async fn failure_in_half_open_reopens_immediately() {
    let breaker = breaker(3, 2, Duration::from_secs(1));
    for _ in 0..3 {
        breaker.record_failure();
    }

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    assert_eq!(breaker.record_failure(), CircuitState::Open);

    // The cool-down restarts from the re-open.
    tokio::time::advance(Duration::from_millis(900)).await;
    assert!(breaker.is_open());
    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(!breaker.is_open());
}

#[tokio::test(start_paused = true)]
async fn success_threshold_closes_and_failure_resets_progress() {
    let breaker = breaker(1, 3, Duration::from_secs(1));
    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    breaker.record_success();
    breaker.record_success();
    assert_eq!(breaker.record_failure(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(breaker.metrics().success_count, 0);

    assert_eq!(breaker.record_success(), CircuitState::HalfOpen);
    assert_eq!(breaker.record_success(), CircuitState::HalfOpen);
    assert_eq!(breaker.record_success(), CircuitState::Closed);
    assert_eq!(breaker.metrics().failure_count, 0);
}

#[tokio::test(start_paused = true)]
async fn transitions_are_reported_in_order() {
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&transitions);

    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .recovery_timeout(Duration::from_secs(1))
            .on_state_transition(move |from, to| {
                seen.lock().unwrap().push((from, to));
            })
            .build()
            .unwrap(),
    );

    breaker.record_failure();
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(breaker.check().is_ok());
    breaker.record_success();

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}
