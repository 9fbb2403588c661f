//! Newline-delimited JSON decoding.

use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use arrow_json::ReaderBuilder;
use arrow_json::reader::infer_json_schema;
use dl_error::{Result, StoreError};
use std::io::Cursor;
use std::sync::Arc;
use tracing::trace;

/// Rows per decoded chunk before the chunks are concatenated.
const DECODE_BATCH_SIZE: usize = 8192;

/// Decode an NDJSON document into a single RecordBatch.
///
/// The schema is inferred from every line, so the output has the union of
/// the fields seen in the file. A line that is not a JSON object fails the
/// whole decode; there is no skip-bad-line mode. An empty or whitespace-only
/// document decodes to an empty batch with no columns.
pub fn decode_ndjson(data: &[u8], location: &str) -> Result<RecordBatch> {
    let invalid = |message: String| StoreError::InvalidFormat {
        location: location.to_string(),
        message,
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let (schema, lines) = infer_json_schema(Cursor::new(data), None)
        .map_err(|e| invalid(format!("schema inference failed: {}", e)))?;
    let schema = Arc::new(schema);

    trace!(
        location = location,
        fields = schema.fields().len(),
        lines = lines,
        "Inferred NDJSON schema"
    );

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(DECODE_BATCH_SIZE)
        .build(Cursor::new(data))
        .map_err(|e| invalid(e.to_string()))?;

    let chunks = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(e.to_string()))?;

    let batch = concat_batches(&schema, &chunks).map_err(|e| invalid(e.to_string()))?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::DataType;

    const EVENTS: &str = concat!(
        r#"{"event_time":"2024-03-05T10:00:00Z","user_id":1}"#,
        "\n",
        r#"{"event_time":"2024-03-05T11:00:00Z","user_id":2}"#,
        "\n",
    );

    #[test]
    fn test_decode_events() {
        let batch = decode_ndjson(EVENTS.as_bytes(), "s3://raw/events.jsonl").unwrap();

        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(
            schema.field_with_name("event_time").unwrap().data_type(),
            &DataType::Utf8
        );
        assert_eq!(
            schema.field_with_name("user_id").unwrap().data_type(),
            &DataType::Int64
        );

        let times = batch
            .column_by_name("event_time")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(times.value(0), "2024-03-05T10:00:00Z");

        let ids = batch
            .column_by_name("user_id")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.value(1), 2);
    }

    #[test]
    fn test_decode_union_of_fields() {
        let data = "{\"a\":1}\n{\"b\":\"x\"}\n";
        let batch = decode_ndjson(data.as_bytes(), "mem").unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);
        assert!(batch.column_by_name("a").unwrap().is_null(1));
    }

    #[test]
    fn test_decode_malformed_line_fails_whole_read() {
        let data = "{\"a\":1}\n{not json}\n{\"a\":3}\n";
        let err = decode_ndjson(data.as_bytes(), "s3://raw/bad.jsonl").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Invalid record batch"), "{}", msg);
        assert!(msg.contains("s3://raw/bad.jsonl"), "{}", msg);
    }

    #[test]
    fn test_decode_empty_document() {
        let batch = decode_ndjson(b"  \n\n", "mem").unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 0);
    }
}
