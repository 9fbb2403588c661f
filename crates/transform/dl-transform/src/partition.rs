//! Daily partition selection.

use crate::date::first_date;
use dl_error::Result;
use dl_types::{Batch, PartitionPath, TransformResult};
use tracing::debug;

/// Selects the output partition for a batch from one of its date columns.
#[derive(Debug, Clone)]
pub struct PartitionTransform {
    date_field: String,
    enabled: bool,
}

impl PartitionTransform {
    pub fn new(date_field: impl Into<String>, enabled: bool) -> Self {
        Self {
            date_field: date_field.into(),
            enabled,
        }
    }

    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Computes the partition path for `batch`.
    ///
    /// The batch is passed through unchanged. The path is empty when
    /// partitioning is disabled, the date column is absent, or the batch has
    /// no rows.
    ///
    /// # Errors
    ///
    /// Fails if any value of the date column is null, unparseable, or of a
    /// type that cannot hold a timestamp.
    pub fn apply(&self, batch: Batch) -> Result<TransformResult> {
        if !self.enabled {
            return Ok(unpartitioned(batch));
        }

        let Some(column) = batch.record_batch().column_by_name(&self.date_field) else {
            debug!(
                field = %self.date_field,
                source = %batch.metadata().source,
                "Date field not present, writing unpartitioned"
            );
            return Ok(unpartitioned(batch));
        };

        let partition_path = match first_date(column, &self.date_field)? {
            Some(date) => PartitionPath::from_date(date),
            None => PartitionPath::unpartitioned(),
        };

        debug!(
            field = %self.date_field,
            rows = batch.num_rows(),
            partition = %partition_path,
            "Selected partition"
        );

        Ok(TransformResult {
            batch,
            partition_path,
        })
    }
}

fn unpartitioned(batch: Batch) -> TransformResult {
    TransformResult {
        batch,
        partition_path: PartitionPath::unpartitioned(),
    }
}

/// One-shot form of [`PartitionTransform::apply`].
pub fn transform(batch: Batch, date_field: &str, partition_enabled: bool) -> Result<TransformResult> {
    PartitionTransform::new(date_field, partition_enabled).apply(batch)
}
