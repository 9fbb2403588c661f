//! Queue adapters.
//!
//! Implementations of [`MessageQueue`](dl_traits::MessageQueue):
//!
//! - [`SqsQueue`]: AWS SQS with long polling (production)
//! - [`MemoryQueue`]: in-process FIFO (tests and local runs)

mod memory;
mod sqs;

pub use memory::MemoryQueue;
pub use sqs::{SqsQueue, SqsQueueConfig};
