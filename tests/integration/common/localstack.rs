//! LocalStack test context and utilities.

use arrow::record_batch::RecordBatch;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use dl_store::{ObjectStoreClient, StoreConfig};
use dl_worker::{SqsQueue, SqsQueueConfig};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::time::Duration;

const ACCESS_KEY: &str = "test";
const SECRET_KEY: &str = "test";

/// LocalStack test context providing S3 and SQS clients.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub sqs: SqsClient,
    pub sdk_config: aws_config::SdkConfig,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .credentials_provider(Credentials::new(ACCESS_KEY, SECRET_KEY, None, None, "test"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            sqs: SqsClient::new(&sdk_config),
            sdk_config,
            endpoint,
            region,
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Store client pointed at LocalStack.
    pub fn store(&self) -> ObjectStoreClient {
        ObjectStoreClient::new(
            StoreConfig::s3(&self.region)
                .with_endpoint(&self.endpoint)
                .with_credentials(ACCESS_KEY, SECRET_KEY, None),
        )
    }

    /// Queue adapter with a short long-poll wait.
    pub fn queue(&self, queue_url: &str) -> SqsQueue {
        SqsQueue::from_sdk_config(
            &self.sdk_config,
            SqsQueueConfig::new(queue_url).with_wait_time(1),
        )
    }

    /// Create an S3 bucket if it does not exist yet.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Create an SQS queue, or return the URL of the existing one.
    pub async fn create_queue(&self, name: &str) -> Result<String, aws_sdk_sqs::Error> {
        let result = self.sqs.create_queue().queue_name(name).send().await?;
        Ok(result.queue_url.unwrap_or_default())
    }

    pub async fn delete_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.delete_queue().queue_url(queue_url).send().await?;
        Ok(())
    }

    pub async fn purge_queue(&self, queue_url: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs.purge_queue().queue_url(queue_url).send().await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    /// Upload NDJSON text to S3.
    pub async fn upload_ndjson(
        &self,
        bucket: &str,
        key: &str,
        data: &str,
    ) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.as_bytes().to_vec().into())
            .content_type("application/x-ndjson")
            .send()
            .await?;
        Ok(())
    }

    /// Fetch an object's bytes.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Vec<u8> {
        let output = self
            .s3
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap();
        output.body.collect().await.unwrap().into_bytes().to_vec()
    }

    /// List keys in a bucket under an optional prefix.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, aws_sdk_s3::Error> {
        let mut request = self.s3.list_objects_v2().bucket(bucket);
        if let Some(p) = prefix {
            request = request.prefix(p);
        }

        let result = request.send().await?;
        Ok(result
            .contents()
            .iter()
            .filter_map(|o| o.key().map(String::from))
            .collect())
    }

    /// Delete every object in a bucket.
    pub async fn empty_bucket(&self, bucket: &str) {
        for key in self.list_objects(bucket, None).await.unwrap_or_default() {
            self.s3.delete_object().bucket(bucket).key(&key).send().await.ok();
        }
    }

    pub async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), aws_sdk_sqs::Error> {
        self.sqs
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await?;
        Ok(())
    }
}

/// NDJSON fixture of `num_records` events, all on `date` (`YYYY-MM-DD`).
pub fn generate_events_ndjson(num_records: usize, date: &str) -> String {
    (0..num_records)
        .map(|i| {
            format!(
                r#"{{"event_id":{},"user":"user_{}","event_time":"{}T{:02}:00:00Z"}}"#,
                i,
                i % 7,
                date,
                i % 24
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Storage event notification body for one object.
pub fn event_envelope(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": { "name": bucket },
                "object": { "key": key }
            }
        }]
    })
    .to_string()
}

/// Decode a Parquet object into its record batches.
pub fn read_parquet_rows(data: Vec<u8>) -> Vec<RecordBatch> {
    ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(data))
        .unwrap()
        .build()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}
