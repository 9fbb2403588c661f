//! dl-metrics - OpenTelemetry metrics for the ingestion worker.
//!
//! Provides [`OtelMetrics`], an implementation of [`MetricsSink`] that
//! records per-file and per-poll-cycle instruments with a `worker_id`
//! dimension. Metrics can be exported to any OpenTelemetry-compatible
//! backend such as Prometheus, CloudWatch, or Datadog.
//!
//! Instrument names follow the metric set the dashboards already use:
//!
//! | Instrument             | Kind      | Unit    |
//! |------------------------|-----------|---------|
//! | `FilesProcessed`       | counter   | files   |
//! | `FilesSuccess`         | counter   | files   |
//! | `FilesError`           | counter   | files   |
//! | `ProcessingTime`       | histogram | s       |
//! | `FileSize`             | histogram | bytes   |
//! | `SQSMessagesReceived`  | counter   | messages|
//! | `SQSMessagesProcessed` | counter   | messages|
//! | `SQSSuccessRate`       | histogram | percent |
//!
//! # Example
//!
//! ```ignore
//! use dl_metrics::{MetricsConfig, OtelMetrics};
//!
//! let config = MetricsConfig::new("worker-1")
//!     .with_otlp_endpoint("http://localhost:4317");
//! let metrics = OtelMetrics::new(config)?;
//! ```

use dl_traits::{FileOutcome, MetricsSink};
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Meter name all instruments are registered under.
const METER_NAME: &str = "datalake";

/// Configuration for metrics collection.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Worker identifier - added as a dimension to all metrics.
    pub worker_id: String,

    /// Service name for metrics attribution.
    pub service_name: String,

    /// OTLP endpoint for exporting metrics (optional).
    /// If not set, metrics are recorded against a no-op meter.
    pub otlp_endpoint: Option<String>,

    /// Export interval in seconds.
    pub export_interval_secs: u64,
}

impl MetricsConfig {
    /// Create a new metrics configuration for a worker.
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            service_name: "dl-worker".to_string(),
            otlp_endpoint: None,
            export_interval_secs: 60,
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_export_interval(mut self, interval_secs: u64) -> Self {
        self.export_interval_secs = interval_secs;
        self
    }
}

/// OpenTelemetry-backed [`MetricsSink`].
///
/// Recording never fails: the OpenTelemetry API swallows export errors and
/// reports them through its own error handler.
pub struct OtelMetrics {
    worker_id: String,
    attributes: Vec<KeyValue>,

    files_processed: Counter<u64>,
    files_success: Counter<u64>,
    files_error: Counter<u64>,
    processing_time: Histogram<f64>,
    file_size: Histogram<u64>,

    messages_received: Counter<u64>,
    messages_processed: Counter<u64>,
    success_rate: Histogram<f64>,

    /// Kept alive for the duration of metrics collection.
    meter_provider: Option<SdkMeterProvider>,
}

impl OtelMetrics {
    /// Create the metrics sink.
    ///
    /// If an OTLP endpoint is configured, metrics are exported periodically
    /// and the provider is installed globally. Must then be called from
    /// within a Tokio runtime.
    pub fn new(config: MetricsConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!(
            worker_id = %config.worker_id,
            service_name = %config.service_name,
            otlp_endpoint = ?config.otlp_endpoint,
            "Initializing metrics"
        );

        let meter_provider = if let Some(endpoint) = &config.otlp_endpoint {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?;

            let reader = PeriodicReader::builder(exporter, runtime::Tokio)
                .with_interval(Duration::from_secs(config.export_interval_secs))
                .build();

            let provider = MeterProviderBuilder::default()
                .with_resource(Resource::new(vec![KeyValue::new(
                    "service.name",
                    config.service_name.clone(),
                )]))
                .with_reader(reader)
                .build();

            global::set_meter_provider(provider.clone());
            Some(provider)
        } else {
            debug!("No OTLP endpoint configured, metrics will not be exported");
            None
        };

        let meter = global::meter(METER_NAME);
        Ok(Self::with_meter(&meter, config, meter_provider))
    }

    fn with_meter(
        meter: &Meter,
        config: MetricsConfig,
        meter_provider: Option<SdkMeterProvider>,
    ) -> Self {
        let attributes = vec![
            KeyValue::new("worker_id", config.worker_id.clone()),
            KeyValue::new("service", config.service_name),
        ];

        Self {
            worker_id: config.worker_id,
            attributes,
            files_processed: meter
                .u64_counter("FilesProcessed")
                .with_description("Files taken through the processing pipeline")
                .with_unit("files")
                .build(),
            files_success: meter
                .u64_counter("FilesSuccess")
                .with_description("Files processed successfully")
                .with_unit("files")
                .build(),
            files_error: meter
                .u64_counter("FilesError")
                .with_description("Files that failed every attempt")
                .with_unit("files")
                .build(),
            processing_time: meter
                .f64_histogram("ProcessingTime")
                .with_description("Wall time spent on one file, all attempts included")
                .with_unit("s")
                .build(),
            file_size: meter
                .u64_histogram("FileSize")
                .with_description("Size of source objects")
                .with_unit("bytes")
                .build(),
            messages_received: meter
                .u64_counter("SQSMessagesReceived")
                .with_description("Messages received from the queue")
                .with_unit("messages")
                .build(),
            messages_processed: meter
                .u64_counter("SQSMessagesProcessed")
                .with_description("Messages handled successfully")
                .with_unit("messages")
                .build(),
            success_rate: meter
                .f64_histogram("SQSSuccessRate")
                .with_description("Share of received messages handled successfully per poll")
                .with_unit("percent")
                .build(),
            meter_provider,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Flush pending exports and shut the provider down.
    pub fn shutdown(&self) {
        if let Some(provider) = &self.meter_provider {
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "Error shutting down meter provider");
            }
        }
        info!("Metrics shutdown complete");
    }
}

impl MetricsSink for OtelMetrics {
    fn record_file(&self, outcome: FileOutcome, elapsed: Duration, source_bytes: u64) {
        self.files_processed.add(1, &self.attributes);
        match outcome {
            FileOutcome::Success => self.files_success.add(1, &self.attributes),
            FileOutcome::Error => self.files_error.add(1, &self.attributes),
        }
        self.processing_time
            .record(elapsed.as_secs_f64(), &self.attributes);
        if source_bytes > 0 {
            self.file_size.record(source_bytes, &self.attributes);
        }
    }

    fn record_poll_cycle(&self, received: u64, processed: u64) {
        self.messages_received.add(received, &self.attributes);
        self.messages_processed.add(processed, &self.attributes);
        if let Some(rate) = success_rate(received, processed) {
            self.success_rate.record(rate, &self.attributes);
        }
    }
}

/// Percentage of `received` messages that were processed, if any arrived.
fn success_rate(received: u64, processed: u64) -> Option<f64> {
    if received == 0 {
        return None;
    }
    Some(processed as f64 / received as f64 * 100.0)
}
