//! Reference scenarios.

use super::{CallResult, Calls, Unavailable, init_tracing};
use resiliency::{
    BulkheadConfig, CircuitBreakerConfig, ErrorKind, ResiliencyDecorator, ResiliencyError,
    ResiliencyPolicy, RetryConfig, execute,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fast_retry(max_attempts: usize) -> RetryConfig {
    RetryConfig::builder()
        .max_attempts(max_attempts)
        .base_delay(Duration::from_millis(1))
        .jitter(false)
        .build()
        .unwrap()
}

#[tokio::test]
async fn a_succeeds_on_third_attempt() {
    init_tracing();
    let decorator = ResiliencyDecorator::new(ResiliencyPolicy::new().with_retry(fast_retry(3)));
    let token = CancellationToken::new();
    let calls = Calls::default();

    let c = calls.clone();
    let value = execute(&token, &decorator, move || {
        let n = c.next();
        async move {
            if n < 2 {
                Err(Unavailable(n))?
            }
            CallResult::Ok("done")
        }
    })
    .await
    .unwrap();

    assert_eq!(value, "done");
    assert_eq!(calls.count(), 3);
}

#[tokio::test]
async fn b_exhaustion_wraps_last_error() {
    let decorator = ResiliencyDecorator::new(ResiliencyPolicy::new().with_retry(fast_retry(3)));
    let token = CancellationToken::new();
    let calls = Calls::default();

    let c = calls.clone();
    let err = execute(&token, &decorator, move || {
        let n = c.next();
        async move { CallResult::<()>::Err(Unavailable(n).into()) }
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::MaxRetriesExceeded));
    match err {
        ResiliencyError::MaxRetriesExceeded { attempts, source } => {
            assert_eq!(attempts, 3);
            assert_eq!(source, Unavailable(2));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.count(), 3);
}

#[tokio::test]
async fn c_breaker_trips_and_fails_fast() {
    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new().with_circuit_breaker(
            CircuitBreakerConfig::builder()
                .failure_threshold(3)
                .recovery_timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
        ),
    );
    let token = CancellationToken::new();
    let calls = Calls::default();

    let failing = || {
        let c = calls.clone();
        move || {
            let n = c.next();
            async move { CallResult::<()>::Err(Unavailable(n).into()) }
        }
    };

    let first = execute(&token, &decorator, failing()).await.unwrap_err();
    let second = execute(&token, &decorator, failing()).await.unwrap_err();
    assert_eq!(first.kind(), Some(ErrorKind::MaxRetriesExceeded));
    assert_eq!(second.kind(), Some(ErrorKind::MaxRetriesExceeded));

    // The third failure trips the breaker.
    let third = execute(&token, &decorator, failing()).await.unwrap_err();
    assert_eq!(third.kind(), Some(ErrorKind::CircuitOpen));
    assert_eq!(calls.count(), 3);

    let fourth = execute(&token, &decorator, failing()).await.unwrap_err();
    assert_eq!(fourth.kind(), Some(ErrorKind::CircuitOpen));
    assert_eq!(calls.count(), 3, "operation ran while the circuit was open");
}

#[tokio::test(start_paused = true)]
async fn d_bulkhead_rejects_second_caller() {
    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new().with_bulkhead(
            BulkheadConfig::builder()
                .max_concurrent_calls(1)
                .max_wait_duration(Some(Duration::from_millis(50)))
                .build()
                .unwrap(),
        ),
    );
    let token = CancellationToken::new();

    let occupant = {
        let decorator = decorator.clone();
        let token = token.clone();
        tokio::spawn(async move {
            decorator
                .execute(&token, || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    CallResult::Ok(())
                })
                .await
        })
    };
    tokio::task::yield_now().await;

    let start = tokio::time::Instant::now();
    let calls = Calls::default();
    let c = calls.clone();
    let err = decorator
        .execute(&token, move || {
            c.next();
            async { CallResult::Ok(()) }
        })
        .await
        .unwrap_err();

    let waited = start.elapsed();
    assert_eq!(err.kind(), Some(ErrorKind::BulkheadFull));
    assert!(waited >= Duration::from_millis(50));
    assert!(waited < Duration::from_millis(200));
    assert_eq!(calls.count(), 0);

    occupant.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn e_timed_out_attempt_moves_to_next_attempt() {
    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new()
            .with_retry(fast_retry(2))
            .with_timeout(Duration::from_millis(50)),
    );
    let token = CancellationToken::new();
    let calls = Calls::default();

    let c = calls.clone();
    let start = tokio::time::Instant::now();
    let value = decorator
        .execute(&token, move || {
            let n = c.next();
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                CallResult::Ok(n)
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(calls.count(), 2);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn e_single_attempt_reports_timeout() {
    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new().with_timeout(Duration::from_millis(50)),
    );
    let token = CancellationToken::new();

    let err = decorator
        .execute(&token, || async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            CallResult::Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
}
