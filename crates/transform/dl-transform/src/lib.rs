//! Partition transform for the ingestion worker.
//!
//! This crate provides [`PartitionTransform`], which decides where a batch
//! lands in the processed bucket. When partitioning is enabled and the
//! configured date column exists, every value in that column must parse as a
//! timestamp; the first record's calendar date then selects the daily
//! partition `year=Y/month=MM/day=DD/`.
//!
//! Records are never modified, projected or reordered here.
//!
//! # Example
//!
//! ```rust,ignore
//! use dl_transform::PartitionTransform;
//!
//! let transform = PartitionTransform::new("event_time", true);
//! let result = transform.apply(batch)?;
//! assert_eq!(result.partition_path.as_str(), "year=2024/month=03/day=05/");
//! ```

mod date;
mod partition;

pub use partition::{transform, PartitionTransform};
