//! Object store trait for the read and write sides of the pipeline.

use async_trait::async_trait;
use dl_error::Result;
use dl_types::Batch;

/// Thin, stateless I/O boundary to the object store.
///
/// Implementations perform no retries of their own; retrying is the
/// caller's responsibility.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads an object as newline-delimited JSON, one record per line.
    ///
    /// A single malformed line fails the whole read.
    async fn read_records(&self, bucket: &str, key: &str) -> Result<Batch>;

    /// Serializes `batch` to the columnar format and uploads it as one object.
    ///
    /// An empty batch is not written; [`WriteOutcome::SkippedEmpty`] is returned.
    async fn write_columnar(&self, batch: &Batch, bucket: &str, key: &str) -> Result<WriteOutcome>;
}

/// Result of a columnar write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Object uploaded
    Written {
        /// Encoded size in bytes
        bytes: u64,
    },

    /// Batch had no rows; nothing was uploaded
    SkippedEmpty,
}

impl WriteOutcome {
    /// Bytes uploaded (zero when skipped).
    pub fn bytes_written(&self) -> u64 {
        match self {
            WriteOutcome::Written { bytes } => *bytes,
            WriteOutcome::SkippedEmpty => 0,
        }
    }
}
