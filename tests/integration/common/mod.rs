//! Common utilities for integration tests.
//!
//! Shared LocalStack setup, fixture data and output inspection.

pub mod localstack;

pub use localstack::{event_envelope, generate_events_ndjson, read_parquet_rows, LocalStackTestContext};
