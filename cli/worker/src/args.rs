//! CLI argument definitions for dl-worker.

use clap::Parser;
use dl_worker::WorkerConfig;
use std::path::PathBuf;
use std::time::Duration;

pub use dl_cli_common::LogLevel;

/// Queue-driven ingestion worker.
///
/// Long-polls a notification queue for newly landed NDJSON objects, converts
/// each one to Parquet under a `year=/month=/day=` partition and acknowledges
/// the message once the output is written.
///
/// ## Examples
///
/// Drain a queue and exit once it stays empty:
///   dl-worker --queue-url https://sqs.us-east-1.amazonaws.com/123/raw-events \
///     --raw-bucket raw-events --output-bucket processed-events --max-empty-polls 3
///
/// Against LocalStack:
///   dl-worker --queue-url http://localhost:4566/000000000000/raw-events \
///     --raw-bucket raw --output-bucket processed --endpoint http://localhost:4566
#[derive(Parser, Debug)]
#[command(name = "dl-worker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Queue ===
    /// Notification queue URL
    #[arg(long, env = "DL_QUEUE_URL")]
    pub queue_url: String,

    /// Long-poll wait time in seconds (1-20)
    #[arg(long, env = "DL_WAIT_TIME", default_value = "20", value_parser = parse_wait_time)]
    pub wait_time: i32,

    /// Visibility timeout applied to received messages, in seconds
    #[arg(long, env = "DL_VISIBILITY_TIMEOUT")]
    pub visibility_timeout: Option<i32>,

    // === Buckets ===
    /// Bucket holding the raw NDJSON objects (used for bare-key messages)
    #[arg(long, env = "DL_RAW_BUCKET")]
    pub raw_bucket: String,

    /// Bucket the Parquet output is written to
    #[arg(long, env = "DL_OUTPUT_BUCKET")]
    pub output_bucket: String,

    /// Key prefix for output objects, used verbatim
    #[arg(long, env = "DL_OUTPUT_PREFIX", default_value = "")]
    pub output_prefix: String,

    // === Processing ===
    /// Field whose first value selects the daily partition
    #[arg(long, env = "DL_DATE_FIELD", default_value = "event_time")]
    pub date_field: String,

    /// Write output without date partitioning
    #[arg(long, env = "DL_NO_PARTITION")]
    pub no_partition: bool,

    /// Seconds to wait after an empty poll
    #[arg(long, env = "DL_POLL_INTERVAL", default_value = "10")]
    pub poll_interval: u64,

    /// Processing attempts per message, first attempt included
    #[arg(long, env = "DL_MAX_RETRIES", default_value = "3", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_retries: u32,

    /// Exit after this many consecutive empty polls (runs until interrupted if unset)
    #[arg(long, env = "DL_MAX_EMPTY_POLLS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_empty_polls: Option<u32>,

    /// Worker identifier for logs and metrics
    #[arg(long, env = "DL_WORKER_ID")]
    pub worker_id: Option<String>,

    // === AWS Configuration ===
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom endpoint URL for SQS and S3 (for LocalStack)
    #[arg(long, env = "DL_ENDPOINT")]
    pub endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Observability ===
    /// OTLP endpoint for metrics export (metrics are disabled if unset)
    #[arg(long, env = "DL_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log level
    #[arg(short = 'l', long, env = "DL_LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, env = "DL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Worker configuration described by these arguments.
    pub fn worker_config(&self) -> WorkerConfig {
        let mut config = WorkerConfig::new()
            .with_poll_interval(Duration::from_secs(self.poll_interval))
            .with_max_retries(self.max_retries)
            .with_raw_bucket(&self.raw_bucket)
            .with_output_bucket(&self.output_bucket)
            .with_output_prefix(&self.output_prefix)
            .with_date_field(&self.date_field)
            .with_partition_by_date(!self.no_partition);

        if let Some(polls) = self.max_empty_polls {
            config = config.with_max_empty_polls(polls);
        }
        if let Some(id) = &self.worker_id {
            config = config.with_worker_id(id);
        }
        config
    }
}

/// Parse the long-poll wait time (1-20 seconds).
fn parse_wait_time(s: &str) -> Result<i32, String> {
    let value: i32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(1..=20).contains(&value) {
        return Err(format!("{} is not in 1..=20", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "dl-worker",
        "--queue-url",
        "http://localhost:4566/000000000000/raw-events",
        "--raw-bucket",
        "raw",
        "--output-bucket",
        "processed",
    ];

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        let config = cli.worker_config();

        assert_eq!(cli.wait_time, 20);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert!(config.max_empty_polls.is_none());
        assert_eq!(config.date_field, "event_time");
        assert!(config.partition_by_date);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--max-empty-polls",
            "3",
            "--no-partition",
            "--output-prefix",
            "events/",
            "--worker-id",
            "w1",
        ]);
        let config = Cli::try_parse_from(args).unwrap().worker_config();

        assert_eq!(config.max_empty_polls, Some(3));
        assert!(!config.partition_by_date);
        assert_eq!(config.output_prefix, "events/");
        assert_eq!(config.worker_id, "w1");
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--wait-time", "30"]);
        assert!(Cli::try_parse_from(args).is_err());

        let mut args = REQUIRED.to_vec();
        args.extend(["--max-retries", "0"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_wait_time() {
        assert_eq!(parse_wait_time("1"), Ok(1));
        assert!(parse_wait_time("0").is_err());
        assert!(parse_wait_time("abc").is_err());
    }
}
