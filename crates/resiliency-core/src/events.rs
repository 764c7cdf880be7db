//! Observability hooks.
//!
//! Each mechanism emits its own event enum (circuit transitions, bulkhead
//! admissions, attempt outcomes). Metrics and tracing exporters live outside
//! this workspace and subscribe by registering a [`Listener`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by one of the resiliency mechanisms.
pub trait Event: Send + Sync + fmt::Debug {
    /// Short machine-readable name, e.g. `"state_transition"`.
    fn event_type(&self) -> &'static str;

    /// When the event was produced.
    fn timestamp(&self) -> Instant;

    /// Name of the breaker, bulkhead or decorator that produced the event.
    fn source(&self) -> &str;
}

/// Receives events of type `E`.
pub trait Listener<E: Event>: Send + Sync {
    fn on_event(&self, event: &E);
}

type SharedListener<E> = Arc<dyn Listener<E>>;

/// The listeners registered on one instance.
#[derive(Clone)]
pub struct Listeners<E: Event> {
    inner: Vec<SharedListener<E>>,
}

impl<E: Event> Listeners<E> {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: Listener<E> + 'static,
    {
        self.inner.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener, in registration order.
    ///
    /// A panicking listener is isolated: the panic is swallowed and delivery
    /// continues with the next listener. Callers must not hold a lock that a
    /// listener could try to take; a listener is free to query the instance
    /// that emitted the event.
    pub fn emit(&self, event: &E) {
        for listener in &self.inner {
            deliver(listener.as_ref(), event);
        }
    }

    /// Delivers a batch of events, each to every listener, in batch order.
    ///
    /// Used by instances that stage events while holding their own lock and
    /// publish them once it is released.
    pub fn emit_all<'a, I>(&self, events: I)
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        if self.inner.is_empty() {
            return;
        }
        for event in events {
            self.emit(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

fn deliver<E: Event>(listener: &dyn Listener<E>, event: &E) {
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener.on_event(event)));
}

impl<E: Event> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.inner.len())
            .finish()
    }
}

/// Adapts a closure into a [`Listener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: std::marker::PhantomData,
        }
    }
}

impl<E, F> Listener<E> for FnListener<E, F>
where
    E: Event,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
