//! Tests for the retry policy and its backoff calculator.
//!
//! Test organization:
//! - backoff.rs: delay sequences, caps, jitter bounds
//! - config.rs: builder defaults and validation
