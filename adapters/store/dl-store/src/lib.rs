//! Object store client for the ingestion worker.
//!
//! Reads newline-delimited JSON objects into Arrow record batches and writes
//! batches back as Parquet. Backed by the `object_store` crate, so the same
//! client talks to S3 (or LocalStack), a local directory tree, or in-memory
//! stores injected by tests.
//!
//! # Example
//!
//! ```ignore
//! use dl_store::{ObjectStoreClient, StoreConfig};
//! use dl_traits::RecordStore;
//!
//! let client = ObjectStoreClient::new(StoreConfig::s3("us-east-1"));
//! let batch = client.read_records("raw-bucket", "incoming/events.jsonl").await?;
//! client.write_columnar(&batch, "processed-bucket", "events/events.parquet").await?;
//! ```

mod client;
mod columnar;
mod config;
mod ndjson;

pub use client::ObjectStoreClient;
pub use columnar::encode_parquet;
pub use config::{StoreBackend, StoreConfig};
pub use ndjson::decode_ndjson;
