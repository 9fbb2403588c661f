//! `object_store`-backed implementation of [`RecordStore`].

use crate::columnar::encode_parquet;
use crate::config::{StoreBackend, StoreConfig};
use crate::ndjson::decode_ndjson;
use async_trait::async_trait;
use dl_error::{Result, StoreError};
use dl_traits::{RecordStore, WriteOutcome};
use dl_types::{Batch, ObjectReference};
use object_store::ObjectStore;
use object_store::PutPayload;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Object store client used for both the raw and the processed buckets.
///
/// Stores are created lazily per bucket and cached, so repeated reads from
/// the same bucket reuse one HTTP connection pool. Tests (and callers with
/// special needs) can pre-register a store for a bucket with
/// [`with_store`](ObjectStoreClient::with_store).
pub struct ObjectStoreClient {
    config: StoreConfig,
    store_cache: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreClient {
    /// Create a client with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            store_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Route all access to `bucket` through `store`.
    pub fn with_store(self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.store_cache.write().insert(bucket.into(), store);
        self
    }

    /// Get or create the store for `bucket`.
    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.store_cache.read().get(bucket) {
            return Ok(Arc::clone(store));
        }

        let mut cache = self.store_cache.write();
        if let Some(store) = cache.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store = self.build_store(bucket)?;
        cache.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }

    fn build_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        match &self.config.backend {
            StoreBackend::Local { root } => {
                let dir = root.join(bucket);
                debug!(bucket = bucket, dir = %dir.display(), "Creating local object store");
                std::fs::create_dir_all(&dir).map_err(|e| {
                    StoreError::Io(format!("Failed to create '{}': {}", dir.display(), e))
                })?;
                let store = LocalFileSystem::new_with_prefix(&dir).map_err(|e| {
                    StoreError::Backend(format!(
                        "Failed to open local store '{}': {}",
                        dir.display(),
                        e
                    ))
                })?;
                Ok(Arc::new(store))
            }
            StoreBackend::S3 => {
                debug!(bucket = bucket, region = %self.config.region, "Creating S3 object store");
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_region(&self.config.region)
                    .with_client_options(self.config.client_options());

                if let (Some(access_key), Some(secret_key)) =
                    (&self.config.access_key, &self.config.secret_key)
                {
                    builder = builder
                        .with_access_key_id(access_key)
                        .with_secret_access_key(secret_key);

                    if let Some(token) = &self.config.session_token {
                        builder = builder.with_token(token);
                    }
                }

                if let Some(endpoint) = &self.config.endpoint {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(true)
                        .with_virtual_hosted_style_request(false);
                }

                let store = builder.build().map_err(|e| {
                    StoreError::Backend(format!("Failed to create S3 store for '{}': {}", bucket, e))
                })?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Map an `object_store` error onto the store error taxonomy.
fn classify(error: object_store::Error, location: &str) -> StoreError {
    match error {
        object_store::Error::NotFound { .. } => StoreError::NotFound(location.to_string()),
        object_store::Error::PermissionDenied { .. } | object_store::Error::Unauthenticated { .. } => {
            StoreError::AccessDenied(format!("{}: {}", location, error))
        }
        other => StoreError::Backend(format!("{}: {}", location, other)),
    }
}

#[async_trait]
impl RecordStore for ObjectStoreClient {
    async fn read_records(&self, bucket: &str, key: &str) -> Result<Batch> {
        let reference = ObjectReference::new(bucket, key);
        let location = reference.to_string();
        let store = self.store_for(bucket)?;

        debug!(location = %location, "Downloading source object");

        let data = store
            .get(&ObjectPath::from(key))
            .await
            .map_err(|e| classify(e, &location))?
            .bytes()
            .await
            .map_err(|e| classify(e, &location))?;

        let record_batch = decode_ndjson(&data, &location)?;

        info!(
            location = %location,
            bytes = data.len(),
            rows = record_batch.num_rows(),
            columns = record_batch.num_columns(),
            "Read source object"
        );

        Ok(Batch::new(record_batch, reference, data.len() as u64))
    }

    async fn write_columnar(&self, batch: &Batch, bucket: &str, key: &str) -> Result<WriteOutcome> {
        let location = ObjectReference::new(bucket, key).to_string();

        if batch.is_empty() {
            warn!(
                location = %location,
                source = %batch.metadata().source,
                "Batch is empty, no object written"
            );
            return Ok(WriteOutcome::SkippedEmpty);
        }

        let encoded = encode_parquet(batch.record_batch(), &location)?;
        let bytes = encoded.len() as u64;

        let store = self.store_for(bucket)?;
        store
            .put(&ObjectPath::from(key), PutPayload::from(encoded))
            .await
            .map_err(|e| classify(e, &location))?;

        info!(
            location = %location,
            rows = batch.num_rows(),
            bytes = bytes,
            "Wrote columnar object"
        );

        Ok(WriteOutcome::Written { bytes })
    }
}
