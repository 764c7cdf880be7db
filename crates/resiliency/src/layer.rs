//! Tower integration.

use crate::decorator::ResiliencyDecorator;
use futures::future::BoxFuture;
use resiliency_core::ResiliencyError;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service, ServiceExt};

/// A Tower layer that runs every request through a [`ResiliencyDecorator`].
///
/// ```rust
/// use resiliency::{ResiliencyDecorator, ResiliencyLayer, ResiliencyPolicy, RetryConfig};
/// use tower::{service_fn, Layer, ServiceExt};
///
/// # async fn example() {
/// let decorator = ResiliencyDecorator::new(
///     ResiliencyPolicy::new().with_retry(RetryConfig::builder().build().unwrap()),
/// );
///
/// let svc = ResiliencyLayer::new(decorator).layer(service_fn(|req: String| async move {
///     Ok::<_, std::io::Error>(req.len())
/// }));
///
/// let len = svc.oneshot("hello".to_string()).await.unwrap();
/// assert_eq!(len, 5);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ResiliencyLayer {
    decorator: ResiliencyDecorator,
    token: CancellationToken,
}

impl ResiliencyLayer {
    pub fn new(decorator: ResiliencyDecorator) -> Self {
        Self {
            decorator,
            token: CancellationToken::new(),
        }
    }

    /// Cancels every in-flight and future call of the wrapped services once
    /// `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }
}

impl From<ResiliencyDecorator> for ResiliencyLayer {
    fn from(decorator: ResiliencyDecorator) -> Self {
        Self::new(decorator)
    }
}

impl<S> Layer<S> for ResiliencyLayer {
    type Service = Resilient<S>;

    fn layer(&self, service: S) -> Self::Service {
        Resilient {
            inner: service,
            decorator: self.decorator.clone(),
            token: self.token.clone(),
        }
    }
}

/// A service wrapped by [`ResiliencyLayer`].
///
/// Each attempt drives a fresh clone of the inner service to readiness and
/// sends it a clone of the request.
#[derive(Clone, Debug)]
pub struct Resilient<S> {
    inner: S,
    decorator: ResiliencyDecorator,
    token: CancellationToken,
}

impl<S> Resilient<S> {
    pub fn decorator(&self) -> &ResiliencyDecorator {
        &self.decorator
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, Req> Service<Req> for Resilient<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = ResiliencyError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness is awaited per attempt inside `oneshot`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        let decorator = self.decorator.clone();
        let token = self.token.clone();

        Box::pin(async move {
            decorator
                .execute(&token, move || {
                    let svc = inner.clone();
                    let req = req.clone();
                    async move { svc.oneshot(req).await.map_err(ResiliencyError::Operation) }
                })
                .await
        })
    }
}
