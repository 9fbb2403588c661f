//! Record batch wrapper carrying source metadata.

use crate::ObjectReference;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Records read from one source object, in Arrow columnar form.
///
/// The inner `RecordBatch` is stored in an `Arc`, so cloning a `Batch`
/// does not copy column data.
#[derive(Clone)]
pub struct Batch {
    inner: Arc<RecordBatch>,
    metadata: BatchMetadata,
}

/// Metadata associated with a batch.
#[derive(Clone, Debug)]
pub struct BatchMetadata {
    /// Object the records were read from
    pub source: ObjectReference,

    /// Number of records in this batch
    pub record_count: usize,

    /// Size of the source object in bytes
    pub source_bytes: u64,
}

impl Batch {
    /// Wrap a RecordBatch read from `source`.
    pub fn new(batch: RecordBatch, source: ObjectReference, source_bytes: u64) -> Self {
        let record_count = batch.num_rows();
        Self {
            inner: Arc::new(batch),
            metadata: BatchMetadata {
                source,
                record_count,
                source_bytes,
            },
        }
    }

    /// Returns a reference to the underlying RecordBatch.
    #[inline]
    pub fn record_batch(&self) -> &RecordBatch {
        &self.inner
    }

    /// Returns metadata about this batch.
    #[inline]
    pub fn metadata(&self) -> &BatchMetadata {
        &self.metadata
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.inner.num_rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.num_rows() == 0
    }

    #[inline]
    pub fn schema(&self) -> SchemaRef {
        self.inner.schema()
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("metadata", &self.metadata)
            .field("schema", &self.inner.schema())
            .finish()
    }
}
