//! Decorator metrics regression tests

use super::helpers::*;
use resiliency::{ResiliencyDecorator, ResiliencyError, ResiliencyPolicy, RetryConfig};
use serial_test::serial;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
#[serial]
async fn decorator_metrics_exist() {
    init_recorder();

    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new()
            .with_name("test_decorator")
            .with_retry(
                RetryConfig::builder()
                    .max_attempts(2)
                    .base_delay(Duration::from_millis(1))
                    .build()
                    .unwrap(),
            ),
    );
    let token = CancellationToken::new();

    let _ = decorator
        .execute(&token, || async { Ok::<_, ResiliencyError<()>>(()) })
        .await;
    let _ = decorator
        .execute(&token, || async {
            Err::<(), _>(ResiliencyError::Operation(()))
        })
        .await;

    assert_counter_exists("resiliency_attempts_total");
    assert_metric_has_label("resiliency_attempts_total", "decorator", "test_decorator");
    assert_metric_has_label("resiliency_attempts_total", "result", "success");
    assert_metric_has_label("resiliency_attempts_total", "result", "failure");

    assert_counter_exists("resiliency_calls_total");
    assert_metric_has_label("resiliency_calls_total", "outcome", "success");
    assert_metric_has_label("resiliency_calls_total", "outcome", "max_retries_exceeded");
}

#[tokio::test]
#[serial]
async fn decorator_cancellation_metric() {
    init_recorder();

    let decorator =
        ResiliencyDecorator::new(ResiliencyPolicy::new().with_name("cancel_decorator"));
    let token = CancellationToken::new();
    token.cancel();

    let _ = decorator
        .execute(&token, || async { Ok::<_, ResiliencyError<()>>(()) })
        .await;

    assert_metric_has_label("resiliency_calls_total", "decorator", "cancel_decorator");
    assert_metric_has_label("resiliency_calls_total", "outcome", "cancelled");
}
