//! The decorator as a tower layer.

use super::{Calls, Unavailable};
use resiliency::{
    BulkheadConfig, ErrorKind, ResiliencyDecorator, ResiliencyLayer, ResiliencyPolicy, RetryConfig,
};
use std::time::Duration;
use tower::{Layer, ServiceBuilder, ServiceExt, service_fn};

#[tokio::test]
async fn retries_a_flaky_service() {
    let calls = Calls::default();
    let c = calls.clone();
    let svc = service_fn(move |req: String| {
        let n = c.next();
        async move {
            if n == 0 {
                Err(Unavailable(n))
            } else {
                Ok(req.to_uppercase())
            }
        }
    });

    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new().with_retry(
            RetryConfig::builder()
                .base_delay(Duration::from_millis(1))
                .build()
                .unwrap(),
        ),
    );
    let svc = ServiceBuilder::new()
        .layer(ResiliencyLayer::new(decorator))
        .service(svc);

    assert_eq!(svc.oneshot("ping".to_string()).await.unwrap(), "PING");
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn service_errors_surface_wrapped() {
    let svc = service_fn(|_: ()| async { Err::<(), _>(Unavailable(0)) });
    let svc = ResiliencyLayer::from(ResiliencyDecorator::new(ResiliencyPolicy::new())).layer(svc);

    let err = svc.oneshot(()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MaxRetriesExceeded));
    assert_eq!(err.into_operation_error(), Some(Unavailable(0)));
}

#[tokio::test(start_paused = true)]
async fn clones_share_one_bulkhead() {
    let decorator = ResiliencyDecorator::new(
        ResiliencyPolicy::new().with_bulkhead(
            BulkheadConfig::builder()
                .max_concurrent_calls(1)
                .max_wait_duration(Some(Duration::ZERO))
                .build()
                .unwrap(),
        ),
    );
    let svc = ResiliencyLayer::new(decorator).layer(service_fn(|_: ()| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, Unavailable>(())
    }));

    let first = tokio::spawn(svc.clone().oneshot(()));
    tokio::task::yield_now().await;

    let err = svc.clone().oneshot(()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::BulkheadFull));
    first.await.unwrap().unwrap();
}
