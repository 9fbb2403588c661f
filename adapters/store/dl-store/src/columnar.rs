//! Columnar (Parquet) encoding.

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use dl_error::{Result, StoreError};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

/// Encode a RecordBatch as a Snappy-compressed Parquet file held in memory.
pub fn encode_parquet(batch: &RecordBatch, location: &str) -> Result<Bytes> {
    let encode_err = |message: String| StoreError::Encode {
        location: location.to_string(),
        message,
    };

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))
        .map_err(|e| encode_err(e.to_string()))?;
    writer.write(batch).map_err(|e| encode_err(e.to_string()))?;
    writer.close().map_err(|e| encode_err(e.to_string()))?;

    Ok(Bytes::from(buffer))
}
