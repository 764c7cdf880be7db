//! Tests for the semaphore bulkhead.
//!
//! Test organization:
//! - permits.rs: permit accounting and release on every exit path
//! - timeout.rs: bounded waits
//! - concurrency.rs: capacity under parallel load


use resiliency_bulkhead::{Bulkhead, BulkheadConfig};
use std::time::Duration;

pub(crate) fn bulkhead(max: usize, wait: Option<Duration>) -> Bulkhead {
    Bulkhead::new(
        BulkheadConfig::builder()
            .name("it")
            .max_concurrent_calls(max)
            .max_wait_duration(wait)
            .build()
            .unwrap(),
    )
}
