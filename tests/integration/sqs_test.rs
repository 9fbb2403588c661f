//! SQS adapter tests against LocalStack.

use crate::common::{event_envelope, LocalStackTestContext};
use dl_traits::MessageQueue;
use dl_types::MessageBody;
use dl_worker::{SqsQueue, SqsQueueConfig};
use std::time::Duration;

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_sqs_queue_receive_and_delete() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("dl-receive-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    ctx.send_message(&queue_url, &event_envelope("raw", "incoming/a.jsonl"))
        .await
        .unwrap();

    let queue = ctx.queue(&queue_url);
    assert_eq!(queue.address(), queue_url);

    let messages = queue.receive(1).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].receive_count, 1);

    let reference = MessageBody::parse(&messages[0].body).reference("fallback");
    assert_eq!(reference.bucket, "raw");
    assert_eq!(reference.key, "incoming/a.jsonl");

    queue.delete(&messages[0].receipt_handle).await.unwrap();

    let depth = queue.depth().await.unwrap();
    assert!(depth.is_empty());

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_sqs_queue_empty_receive() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("dl-empty-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    let messages = ctx.queue(&queue_url).receive(1).await.unwrap();
    assert!(messages.is_empty());

    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_undeleted_message_is_redelivered_with_higher_count() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("dl-redeliver-queue").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();
    ctx.send_message(&queue_url, "incoming/a.jsonl").await.unwrap();

    let queue = SqsQueue::from_sdk_config(
        &ctx.sdk_config,
        SqsQueueConfig::new(&queue_url)
            .with_wait_time(1)
            .with_visibility_timeout(1),
    );

    let first = queue.receive(1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].body, "incoming/a.jsonl");

    // Not deleted: becomes visible again after the timeout.
    tokio::time::sleep(Duration::from_secs(2)).await;

    let second = queue.receive(1).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, first[0].id);
    assert!(second[0].receive_count >= 2);

    queue.delete(&second[0].receipt_handle).await.unwrap();
    ctx.delete_queue(&queue_url).await.ok();
}
