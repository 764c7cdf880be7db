use crate::events::DecoratorEvent;
use crate::policy::ResiliencyPolicy;
#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
use resiliency_bulkhead::{Bulkhead, BulkheadError, BulkheadPermit};
use resiliency_circuitbreaker::{CircuitBreaker, CircuitState};
use resiliency_core::{ErrorKind, FnListener, Listeners, ResiliencyError};
use std::future::Future;
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Runs operations under a [`ResiliencyPolicy`].
///
/// The circuit breaker and bulkhead are built once, in [`new`](Self::new), and
/// shared by every call and every clone of the decorator.
#[derive(Clone)]
pub struct ResiliencyDecorator {
    policy: Arc<ResiliencyPolicy>,
    circuit_breaker: Option<CircuitBreaker>,
    bulkhead: Option<Bulkhead>,
    listeners: Listeners<DecoratorEvent>,
}

enum Attempt<T, E> {
    Completed(Result<T, ResiliencyError<E>>),
    TimedOut(Duration),
}

/// How the most recent attempt failed.
enum Failure<E> {
    Operation(E),
    TimedOut(Duration),
}

impl ResiliencyDecorator {
    pub fn new(policy: ResiliencyPolicy) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "resiliency_attempts_total",
                "Attempts run by the resiliency decorator, by result"
            );
            describe_counter!(
                "resiliency_calls_total",
                "Calls completed by the resiliency decorator, by outcome"
            );
        });

        let circuit_breaker = policy.circuit_breaker.clone().map(CircuitBreaker::new);
        let bulkhead = policy.bulkhead.clone().map(Bulkhead::new);

        Self {
            policy: Arc::new(policy),
            circuit_breaker,
            bulkhead,
            listeners: Listeners::new(),
        }
    }

    /// Uses an existing breaker, replacing the one built from the policy.
    ///
    /// Lets several decorators trip on the same dependency.
    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    /// Uses an existing bulkhead, replacing the one built from the policy.
    pub fn with_bulkhead(mut self, bulkhead: Bulkhead) -> Self {
        self.bulkhead = Some(bulkhead);
        self
    }

    /// Registers a listener for admission and attempt events.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&DecoratorEvent) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.policy.name
    }

    pub fn policy(&self) -> &ResiliencyPolicy {
        &self.policy
    }

    pub fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.circuit_breaker.as_ref()
    }

    pub fn bulkhead(&self) -> Option<&Bulkhead> {
        self.bulkhead.as_ref()
    }

    /// Runs `operation` through the circuit check, the bulkhead and the
    /// retry loop, in that order.
    ///
    /// `operation` is called once per attempt. An `Err(ResiliencyError::Operation(_))`
    /// is an ordinary failure: it is recorded against the breaker and retried.
    /// Any other error variant comes from a nested resiliency layer and is
    /// returned as is, without being recorded or retried.
    ///
    /// A per-attempt timeout counts as an ordinary failure. If the final
    /// attempt timed out the call fails with [`ResiliencyError::Timeout`],
    /// otherwise exhaustion yields [`ResiliencyError::MaxRetriesExceeded`]
    /// carrying the last operation error.
    ///
    /// The token is checked before anything else and raced against the
    /// bulkhead wait, every attempt and every backoff sleep. When it fires,
    /// the call returns [`ResiliencyError::Cancelled`] and the bulkhead slot
    /// is released.
    pub async fn execute<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, ResiliencyError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ResiliencyError<E>>>,
    {
        if token.is_cancelled() {
            return Err(self.cancelled());
        }

        if let Some(breaker) = &self.circuit_breaker {
            if let Err(err) = breaker.check() {
                self.rejected(ErrorKind::CircuitOpen);
                return Err(err.into_resiliency_error());
            }
        }

        // One slot for the whole call, released on every return below.
        let _permit = self.admit(token).await?;

        let backoff = self.policy.retry.map(|retry| retry.backoff());
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            let started = tokio::time::Instant::now();
            let call = operation();
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.cancelled()),
                outcome = run_attempt(self.policy.timeout, call) => outcome,
            };

            let failure = match outcome {
                Attempt::Completed(Ok(value)) => {
                    if let Some(breaker) = &self.circuit_breaker {
                        breaker.record_success();
                    }
                    self.emit(DecoratorEvent::AttemptSucceeded {
                        decorator: self.policy.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        duration: started.elapsed(),
                    });
                    self.count_attempt("success");
                    self.count_call("success");
                    return Ok(value);
                }
                Attempt::Completed(Err(ResiliencyError::Operation(error))) => {
                    self.emit(DecoratorEvent::AttemptFailed {
                        decorator: self.policy.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        duration: started.elapsed(),
                    });
                    self.count_attempt("failure");
                    Failure::Operation(error)
                }
                Attempt::Completed(Err(structural)) => {
                    #[cfg(feature = "tracing")]
                    debug!(
                        decorator = %self.policy.name,
                        attempt,
                        error = %structural.kind().map_or("cancelled", |kind| kind.as_str()),
                        "nested resiliency error, propagating"
                    );
                    self.count_call("propagated");
                    return Err(structural);
                }
                Attempt::TimedOut(limit) => {
                    self.emit(DecoratorEvent::AttemptTimedOut {
                        decorator: self.policy.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        timeout: limit,
                    });

                    #[cfg(feature = "tracing")]
                    warn!(
                        decorator = %self.policy.name,
                        attempt,
                        timeout_ms = limit.as_millis() as u64,
                        "attempt timed out"
                    );

                    self.count_attempt("timeout");
                    Failure::TimedOut(limit)
                }
            };

            if let Some(breaker) = &self.circuit_breaker {
                if breaker.record_failure() == CircuitState::Open {
                    #[cfg(feature = "tracing")]
                    warn!(
                        decorator = %self.policy.name,
                        breaker = %breaker.name(),
                        attempt,
                        "circuit open after failed attempt, abandoning retries"
                    );
                    self.count_call("circuit_open");
                    return Err(ResiliencyError::CircuitOpen {
                        name: breaker.name().to_string(),
                        remaining: breaker.metrics().remaining_open,
                    });
                }
            }

            if attempt + 1 >= max_attempts {
                return Err(self.exhausted(attempt + 1, failure));
            }

            let delay = backoff.map_or(Duration::ZERO, |backoff| backoff.delay(attempt));
            self.emit(DecoratorEvent::RetryScheduled {
                decorator: self.policy.name.clone(),
                timestamp: Instant::now(),
                attempt,
                delay,
            });

            #[cfg(feature = "tracing")]
            debug!(
                decorator = %self.policy.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after failed attempt"
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    async fn admit<E>(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<BulkheadPermit>, ResiliencyError<E>> {
        let Some(bulkhead) = &self.bulkhead else {
            return Ok(None);
        };

        match bulkhead.acquire(token).await {
            Ok(permit) => Ok(Some(permit)),
            Err(BulkheadError::Cancelled) => Err(self.cancelled()),
            Err(err) => {
                self.rejected(ErrorKind::BulkheadFull);
                Err(err.into_resiliency_error())
            }
        }
    }

    fn rejected(&self, kind: ErrorKind) {
        self.emit(DecoratorEvent::CallRejected {
            decorator: self.policy.name.clone(),
            timestamp: Instant::now(),
            kind,
        });
        self.count_call(kind.as_str());
    }

    fn exhausted<E>(&self, attempts: usize, failure: Failure<E>) -> ResiliencyError<E> {
        self.emit(DecoratorEvent::RetriesExhausted {
            decorator: self.policy.name.clone(),
            timestamp: Instant::now(),
            attempts,
        });

        #[cfg(feature = "tracing")]
        warn!(decorator = %self.policy.name, attempts, "all attempts failed");

        match failure {
            Failure::Operation(source) => {
                self.count_call(ErrorKind::MaxRetriesExceeded.as_str());
                ResiliencyError::MaxRetriesExceeded { attempts, source }
            }
            Failure::TimedOut(timeout) => {
                self.count_call(ErrorKind::Timeout.as_str());
                ResiliencyError::Timeout { timeout }
            }
        }
    }

    fn cancelled<E>(&self) -> ResiliencyError<E> {
        self.emit(DecoratorEvent::Cancelled {
            decorator: self.policy.name.clone(),
            timestamp: Instant::now(),
        });

        #[cfg(feature = "tracing")]
        debug!(decorator = %self.policy.name, "call cancelled");

        self.count_call("cancelled");
        ResiliencyError::Cancelled
    }

    fn emit(&self, event: DecoratorEvent) {
        if !self.listeners.is_empty() {
            self.listeners.emit(&event);
        }
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn count_attempt(&self, result: &'static str) {
        #[cfg(feature = "metrics")]
        counter!(
            "resiliency_attempts_total",
            "decorator" => self.policy.name.clone(),
            "result" => result
        )
        .increment(1);
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn count_call(&self, outcome: &'static str) {
        #[cfg(feature = "metrics")]
        counter!(
            "resiliency_calls_total",
            "decorator" => self.policy.name.clone(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

impl std::fmt::Debug for ResiliencyDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResiliencyDecorator")
            .field("name", &self.policy.name)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("bulkhead", &self.bulkhead)
            .field("retry", &self.policy.retry)
            .field("timeout", &self.policy.timeout)
            .finish()
    }
}

async fn run_attempt<T, E, Fut>(timeout: Option<Duration>, call: Fut) -> Attempt<T, E>
where
    Fut: Future<Output = Result<T, ResiliencyError<E>>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => Attempt::Completed(result),
            Err(_elapsed) => Attempt::TimedOut(limit),
        },
        None => Attempt::Completed(call.await),
    }
}

/// Runs `operation` under `decorator`.
///
/// Same as [`ResiliencyDecorator::execute`].
pub async fn execute<T, E, F, Fut>(
    token: &CancellationToken,
    decorator: &ResiliencyDecorator,
    operation: F,
) -> Result<T, ResiliencyError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ResiliencyError<E>>>,
{
    decorator.execute(token, operation).await
}
