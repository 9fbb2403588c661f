//! Per-object processing pipeline.
//!
//! The handler drives an [`ObjectProcessor`] once per attempt. The production
//! implementation is [`IngestPipeline`], which reads the source object,
//! selects its partition and writes the columnar output.

mod ingest;

pub use ingest::{output_key, IngestPipeline, OutputLayout};

use async_trait::async_trait;
use dl_error::Result;
use dl_types::ObjectReference;
use std::sync::Arc;

/// One attempt at taking a source object through to its output.
#[async_trait]
pub trait ObjectProcessor: Send + Sync {
    /// Process `source`. Any error fails the attempt as a whole.
    async fn process(&self, source: &ObjectReference) -> Result<ProcessReport>;
}

#[async_trait]
impl<P: ObjectProcessor + ?Sized> ObjectProcessor for Arc<P> {
    async fn process(&self, source: &ObjectReference) -> Result<ProcessReport> {
        (**self).process(source).await
    }
}

/// Result of a successful attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Object written, or `None` when the source had no records
    pub output: Option<ObjectReference>,

    /// Records read from the source
    pub records: u64,

    /// Size of the source object
    pub bytes_read: u64,

    /// Size of the written output
    pub bytes_written: u64,
}
