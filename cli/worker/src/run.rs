//! Main execution logic for dl-worker CLI.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use dl_metrics::{MetricsConfig, OtelMetrics};
use dl_store::{ObjectStoreClient, StoreConfig};
use dl_traits::{MessageQueue, MetricsSink, NoopMetrics};
use dl_worker::{IngestPipeline, QueueConsumer, SqsQueue, SqsQueueConfig, StatsSnapshot};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::Cli;

/// Execute the worker with the provided arguments.
pub async fn execute(args: Cli) -> Result<StatsSnapshot> {
    let config = args.worker_config();
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let sdk_config = load_aws_config(&args).await;

    let mut sqs_config = SqsQueueConfig::new(&args.queue_url).with_wait_time(args.wait_time);
    if let Some(timeout) = args.visibility_timeout {
        sqs_config = sqs_config.with_visibility_timeout(timeout);
    }
    let queue = SqsQueue::from_sdk_config(&sdk_config, sqs_config);

    let store = Arc::new(ObjectStoreClient::new(store_config(&args, &sdk_config).await?));
    let pipeline = IngestPipeline::new(store, &config);

    let otel = match &args.otlp_endpoint {
        Some(endpoint) => {
            let metrics_config =
                MetricsConfig::new(&config.worker_id).with_otlp_endpoint(endpoint);
            let otel = OtelMetrics::new(metrics_config)
                .map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {}", e))?;
            Some(Arc::new(otel))
        }
        None => None,
    };
    let metrics: Arc<dyn MetricsSink> = match &otel {
        Some(otel) => otel.clone(),
        None => Arc::new(NoopMetrics),
    };

    match queue.depth().await {
        Ok(depth) => info!(
            visible = depth.visible,
            in_flight = depth.in_flight,
            delayed = depth.delayed,
            "Queue depth at startup"
        ),
        Err(e) => warn!(error = %e, "Could not read queue depth"),
    }

    let mut consumer = QueueConsumer::new(&config, queue, pipeline)
        .context("Invalid worker configuration")?
        .with_metrics(metrics)
        .with_cancellation(shutdown_token());

    let stats = consumer.run().await;

    if let Some(otel) = otel {
        otel.shutdown();
    }

    Ok(stats)
}

/// Token cancelled on the first Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, finishing current message and stopping");
                signal_token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for interrupt signal"),
        }
    });

    token
}

/// Shared AWS configuration for the SDK clients.
async fn load_aws_config(args: &Cli) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(args.region.clone()));

    if let Some(profile) = &args.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint) = &args.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "dl-worker-cli",
        ));
    }

    loader.load().await
}

/// Object store configuration.
///
/// Explicit keys and named profiles are resolved through the AWS SDK and
/// handed to the store as static credentials. Without either, the store
/// uses its own environment and instance-metadata chain.
async fn store_config(args: &Cli, sdk_config: &SdkConfig) -> Result<StoreConfig> {
    let mut config = StoreConfig::s3(&args.region);
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint);
    }

    let explicit = args.access_key.is_some() && args.secret_key.is_some();
    if !explicit && args.profile.is_none() {
        return Ok(config);
    }

    let provider = sdk_config
        .credentials_provider()
        .context("No AWS credentials provider configured")?;
    let credentials = provider
        .provide_credentials()
        .await
        .context("Failed to resolve AWS credentials")?;

    Ok(config.with_credentials(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        credentials.session_token().map(String::from),
    ))
}
