//! Core traits for the datalake ingestion worker.
//!
//! This crate defines the seams between the worker and its collaborators:
//! - [`MessageQueue`] - Notification queue backends (SQS, in-memory)
//! - [`RecordStore`] - Object store reads of NDJSON and writes of columnar output
//! - [`MetricsSink`] - Fire-and-forget metrics emission

pub mod metrics;
pub mod queue;
pub mod store;

pub use metrics::*;
pub use queue::*;
pub use store::*;
