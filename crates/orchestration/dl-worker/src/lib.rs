//! dl-worker - Queue-driven ingestion worker.
//!
//! The worker long-polls a notification queue, resolves each message to an
//! object in the raw bucket, and runs that object through a
//! read → partition → write pipeline into the processed bucket. It provides:
//!
//! - [`QueueConsumer`]: the poll loop, with empty-poll termination and
//!   cancellation
//! - [`MessageHandler`]: per-message dedup gate, bounded retry and ack
//! - [`MessageParser`]: event-envelope or raw-key interpretation of bodies
//! - [`IngestPipeline`]: the read → transform → write stages over a
//!   [`RecordStore`](dl_traits::RecordStore)
//! - Queue adapters: [`SqsQueue`] for production, [`MemoryQueue`] for tests
//!   and local runs
//!
//! Processing is strictly sequential: one message is handled to completion
//! before the next poll. The [`DedupLedger`] lives in process memory, so it
//! only protects a single running instance.
//!
//! # Example
//!
//! ```ignore
//! use dl_worker::{IngestPipeline, QueueConsumer, SqsQueue, SqsQueueConfig, WorkerConfig};
//!
//! let config = WorkerConfig::new()
//!     .with_raw_bucket("raw-events")
//!     .with_output_bucket("processed-events")
//!     .with_max_empty_polls(3);
//!
//! let queue = SqsQueue::from_sdk_config(&sdk_config, SqsQueueConfig::new(queue_url));
//! let pipeline = IngestPipeline::new(store, &config);
//!
//! let mut consumer = QueueConsumer::new(&config, queue, pipeline)?;
//! let stats = consumer.run().await;
//! eprintln!("{} files processed, {} failed", stats.files_succeeded, stats.files_failed);
//! ```

pub mod config;
pub mod consumer;
pub mod handler;
pub mod ledger;
pub mod parser;
pub mod pipeline;
pub mod retry;
pub mod source;
pub mod stats;

#[cfg(test)]
mod testing;

pub use config::WorkerConfig;
pub use consumer::QueueConsumer;
pub use handler::{HandleOutcome, MessageHandler};
pub use ledger::DedupLedger;
pub use parser::MessageParser;
pub use pipeline::{output_key, IngestPipeline, ObjectProcessor, OutputLayout, ProcessReport};
pub use retry::{RetryExhausted, RetryPolicy};
pub use source::{MemoryQueue, SqsQueue, SqsQueueConfig};
pub use stats::{StatsSnapshot, StopReason, WorkerStats};
