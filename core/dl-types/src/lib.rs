//! Core types for the datalake ingestion worker.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`QueueMessage`] - A message as received from the notification queue
//! - [`MessageBody`] - Parsed message body (store event envelope or raw key)
//! - [`ObjectReference`] - Bucket and key of an object in the store
//! - [`Batch`] - Arrow RecordBatch wrapper with source metadata
//! - [`PartitionPath`] / [`TransformResult`] - Output of the transform stage

pub mod batch;
pub mod message;
pub mod partition;

pub use batch::*;
pub use message::*;
pub use partition::*;
