//! Event types for the bulkhead.

use resiliency_core::Event;
use std::time::{Duration, Instant};

/// Events emitted by a bulkhead.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A permit was acquired.
    CallPermitted {
        bulkhead: String,
        timestamp: Instant,
        /// Calls holding a permit, this one included.
        concurrent_calls: usize,
    },
    /// No permit became free in time.
    CallRejected {
        bulkhead: String,
        timestamp: Instant,
        max_concurrent_calls: usize,
    },
    /// A permit was returned.
    CallFinished {
        bulkhead: String,
        timestamp: Instant,
        /// How long the permit was held.
        duration: Duration,
    },
}

impl Event for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { bulkhead, .. }
            | BulkheadEvent::CallRejected { bulkhead, .. }
            | BulkheadEvent::CallFinished { bulkhead, .. } => bulkhead,
        }
    }
}
