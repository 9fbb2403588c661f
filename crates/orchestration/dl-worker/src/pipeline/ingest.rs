//! Read → partition → write pipeline.

use super::{ObjectProcessor, ProcessReport};
use crate::config::WorkerConfig;
use async_trait::async_trait;
use dl_error::{DlError, ProcessingStage, Result};
use dl_traits::{RecordStore, WriteOutcome};
use dl_transform::PartitionTransform;
use dl_types::{ObjectReference, PartitionPath, TransformResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Where output objects are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub bucket: String,
    pub prefix: String,
    pub extension: String,
}

impl OutputLayout {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            bucket: config.output_bucket.clone(),
            prefix: config.output_prefix.clone(),
            extension: config.columnar_extension.clone(),
        }
    }

    /// Output key for `source_key` under `partition`.
    pub fn key_for(&self, source_key: &str, partition: &PartitionPath) -> String {
        output_key(&self.prefix, partition, source_key, &self.extension)
    }
}

/// `{prefix}{partition}{stem}.{extension}`, where `stem` is the last path
/// segment of `source_key` with its final extension removed.
///
/// A leading dot does not count as an extension, so `.hidden` keeps its name.
pub fn output_key(
    prefix: &str,
    partition: &PartitionPath,
    source_key: &str,
    extension: &str,
) -> String {
    let name = source_key.rsplit('/').next().unwrap_or(source_key);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    format!("{}{}{}.{}", prefix, partition, stem, extension)
}

/// Log a failed stage at debug level and tag the error with it.
fn stage_failed(
    stage: ProcessingStage,
    source: &ObjectReference,
) -> impl Fn(DlError) -> DlError + '_ {
    move |error| {
        debug!(stage = %stage, source = %source, error = %error, "Stage failed");
        error.at_stage(stage)
    }
}

/// Production [`ObjectProcessor`]: NDJSON in, partitioned columnar out.
pub struct IngestPipeline<S: RecordStore> {
    store: Arc<S>,
    transform: PartitionTransform,
    output: OutputLayout,
}

impl<S: RecordStore> IngestPipeline<S> {
    /// Build the pipeline from worker configuration.
    pub fn new(store: Arc<S>, config: &WorkerConfig) -> Self {
        Self {
            store,
            transform: PartitionTransform::new(&config.date_field, config.partition_by_date),
            output: OutputLayout::from_config(config),
        }
    }

    pub fn output(&self) -> &OutputLayout {
        &self.output
    }
}

#[async_trait]
impl<S: RecordStore> ObjectProcessor for IngestPipeline<S> {
    async fn process(&self, source: &ObjectReference) -> Result<ProcessReport> {
        let start = Instant::now();

        let batch = self
            .store
            .read_records(&source.bucket, &source.key)
            .await
            .map_err(stage_failed(ProcessingStage::Read, source))?;

        let records = batch.num_rows() as u64;
        let bytes_read = batch.metadata().source_bytes;

        let TransformResult {
            batch,
            partition_path,
        } = self
            .transform
            .apply(batch)
            .map_err(stage_failed(ProcessingStage::Transform, source))?;

        let key = self.output.key_for(&source.key, &partition_path);

        let outcome = self
            .store
            .write_columnar(&batch, &self.output.bucket, &key)
            .await
            .map_err(stage_failed(ProcessingStage::Write, source))?;

        let output = match outcome {
            WriteOutcome::Written { .. } => Some(ObjectReference::new(&self.output.bucket, key)),
            WriteOutcome::SkippedEmpty => None,
        };

        info!(
            source = %source,
            output = output.as_ref().map(|o| o.to_string()).unwrap_or_default(),
            partition = %partition_path,
            records = records,
            bytes_read = bytes_read,
            bytes_written = outcome.bytes_written(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Object processed"
        );

        Ok(ProcessReport {
            output,
            records,
            bytes_read,
            bytes_written: outcome.bytes_written(),
        })
    }
}
