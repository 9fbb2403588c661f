//! End-to-end worker tests using LocalStack.
//!
//! NDJSON objects are uploaded to a raw bucket, notifications are sent to a
//! queue, and the worker runs until the queue stays empty.

use crate::common::{event_envelope, generate_events_ndjson, read_parquet_rows, LocalStackTestContext};
use dl_traits::MessageQueue;
use dl_worker::{IngestPipeline, QueueConsumer, StopReason, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;

fn worker_config(raw: &str, processed: &str) -> WorkerConfig {
    WorkerConfig::new()
        .with_worker_id("integration")
        .with_raw_bucket(raw)
        .with_output_bucket(processed)
        .with_poll_interval(Duration::from_secs(1))
        .with_retry_backoff(Duration::from_millis(200))
        .with_max_empty_polls(2)
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_worker_converts_notified_object() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let (raw, processed) = ("dl-raw-events", "dl-processed-events");
    ctx.create_bucket(raw).await.unwrap();
    ctx.create_bucket(processed).await.unwrap();
    ctx.empty_bucket(processed).await;

    let queue_url = ctx.create_queue("dl-worker-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    ctx.upload_ndjson(raw, "incoming/events.jsonl", &generate_events_ndjson(100, "2024-03-05"))
        .await
        .unwrap();
    ctx.send_message(&queue_url, &event_envelope(raw, "incoming/events.jsonl"))
        .await
        .unwrap();

    let config = worker_config(raw, processed).with_output_prefix("events/");
    let pipeline = IngestPipeline::new(Arc::new(ctx.store()), &config);
    let mut consumer = QueueConsumer::new(&config, ctx.queue(&queue_url), pipeline).unwrap();

    let stats = consumer.run().await;

    assert_eq!(stats.stop_reason, Some(StopReason::EmptyPolls));
    assert_eq!(stats.files_succeeded, 1);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.records_written, 100);

    let key = "events/year=2024/month=03/day=05/events.parquet";
    let keys = ctx.list_objects(processed, Some("events/")).await.unwrap();
    assert_eq!(keys, vec![key.to_string()]);

    let batches = read_parquet_rows(ctx.get_object(processed, key).await);
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 100);
    assert!(batches[0].schema().field_with_name("event_time").is_ok());

    let depth = consumer.queue().depth().await.unwrap();
    assert_eq!(depth.visible + depth.in_flight, 0);

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_worker_handles_raw_key_messages_and_duplicates() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let (raw, processed) = ("dl-raw-keys", "dl-processed-keys");
    ctx.create_bucket(raw).await.unwrap();
    ctx.create_bucket(processed).await.unwrap();
    ctx.empty_bucket(processed).await;

    let queue_url = ctx.create_queue("dl-raw-key-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    for day in ["2024-01-01", "2024-01-02"] {
        let key = format!("incoming/{}.jsonl", day);
        ctx.upload_ndjson(raw, &key, &generate_events_ndjson(10, day))
            .await
            .unwrap();
        ctx.send_message(&queue_url, &key).await.unwrap();
    }
    // Same object announced twice.
    ctx.send_message(&queue_url, "incoming/2024-01-01.jsonl")
        .await
        .unwrap();

    let config = worker_config(raw, processed);
    let pipeline = IngestPipeline::new(Arc::new(ctx.store()), &config);
    let mut consumer = QueueConsumer::new(&config, ctx.queue(&queue_url), pipeline).unwrap();

    let stats = consumer.run().await;

    assert_eq!(stats.messages_received, 3);
    assert_eq!(stats.files_succeeded, 2);
    assert_eq!(stats.duplicates_skipped, 1);

    let mut keys = ctx.list_objects(processed, None).await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "year=2024/month=01/day=01/2024-01-01.parquet".to_string(),
            "year=2024/month=01/day=02/2024-01-02.parquet".to_string(),
        ]
    );

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_worker_leaves_failing_message_on_queue() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let (raw, processed) = ("dl-raw-missing", "dl-processed-missing");
    ctx.create_bucket(raw).await.unwrap();
    ctx.create_bucket(processed).await.unwrap();

    let queue_url = ctx.create_queue("dl-missing-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();
    ctx.send_message(&queue_url, "incoming/never-uploaded.jsonl")
        .await
        .unwrap();

    let config = worker_config(raw, processed).with_max_retries(2);
    let pipeline = IngestPipeline::new(Arc::new(ctx.store()), &config);
    let mut consumer = QueueConsumer::new(&config, ctx.queue(&queue_url), pipeline).unwrap();

    let stats = consumer.run().await;

    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.files_succeeded, 0);
    assert!(stats.has_failures());

    // Still owned by the queue, in flight until its visibility timeout expires.
    let depth = consumer.queue().depth().await.unwrap();
    assert_eq!(depth.visible + depth.in_flight, 1);

    ctx.delete_queue(&queue_url).await.ok();
}
