//! Configuration types for the worker.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wait between retry attempts of one message.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Configuration for a worker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Identifier used in logs and as the metrics dimension
    pub worker_id: String,

    /// Idle time after an empty poll (or a failed receive) before polling again
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,

    /// Total processing attempts per message, first attempt included
    pub max_retries: u32,

    /// Fixed wait between attempts
    #[serde(with = "duration_secs")]
    pub retry_backoff: Duration,

    /// Stop after this many consecutive empty polls; `None` runs until cancelled
    pub max_empty_polls: Option<u32>,

    /// Bucket used when a message body is a bare key
    pub raw_bucket: String,

    /// Bucket the columnar output is written to
    pub output_bucket: String,

    /// Key prefix for output objects, used verbatim
    pub output_prefix: String,

    /// Column whose first value selects the daily partition
    pub date_field: String,

    /// Write under `year=/month=/day=` partitions
    pub partition_by_date: bool,

    /// Extension of output objects
    pub columnar_extension: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("dl-worker-{}", std::process::id()),
            poll_interval: Duration::from_secs(10),
            max_retries: 3,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_empty_polls: None,
            raw_bucket: String::new(),
            output_bucket: String::new(),
            output_prefix: String::new(),
            date_field: "event_time".to_string(),
            partition_by_date: true,
            columnar_extension: "parquet".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the total number of attempts per message.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Stop after `polls` consecutive empty polls.
    pub fn with_max_empty_polls(mut self, polls: u32) -> Self {
        self.max_empty_polls = Some(polls);
        self
    }

    pub fn with_raw_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.raw_bucket = bucket.into();
        self
    }

    pub fn with_output_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.output_bucket = bucket.into();
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }

    pub fn with_partition_by_date(mut self, enabled: bool) -> Self {
        self.partition_by_date = enabled;
        self
    }

    pub fn with_columnar_extension(mut self, extension: impl Into<String>) -> Self {
        self.columnar_extension = extension.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        if self.max_empty_polls == Some(0) {
            return Err("max_empty_polls must be at least 1 when set".to_string());
        }
        if self.raw_bucket.is_empty() {
            return Err("raw_bucket must be set".to_string());
        }
        if self.output_bucket.is_empty() {
            return Err("output_bucket must be set".to_string());
        }
        if self.partition_by_date && self.date_field.is_empty() {
            return Err("date_field must be set when partitioning by date".to_string());
        }
        if self.columnar_extension.is_empty() || self.columnar_extension.starts_with('.') {
            return Err("columnar_extension must be non-empty and without a leading dot".to_string());
        }
        Ok(())
    }
}

/// Serde helper storing durations as whole seconds.
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
