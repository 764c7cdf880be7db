//! Shared breaker handles under parallel load.

use super::breaker;
use resiliency_circuitbreaker::CircuitState;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn parallel_failures_trip_exactly_once() {
    let transitions = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&transitions);

    let breaker = resiliency_circuitbreaker::CircuitBreaker::new(
        resiliency_circuitbreaker::CircuitBreakerConfig::builder()
            .failure_threshold(50)
            .recovery_timeout(Duration::from_secs(60))
            .on_state_transition(move |_, to| {
                if to == CircuitState::Open {
                    t.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let breaker = breaker.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    breaker.record_failure();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(breaker.is_open());
    assert_eq!(transitions.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_outcomes_never_corrupt_counters() {
    let breaker = breaker(1_000_000, 1, Duration::from_secs(60));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    if i % 2 == 0 {
                        breaker.record_success();
                    } else {
                        breaker.record_failure();
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let metrics = breaker.metrics();
    assert_eq!(metrics.state, CircuitState::Closed);
    assert!(metrics.failure_count <= 8 * 500);
}
