//! SQS queue adapter.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::types::{MessageSystemAttributeName, QueueAttributeName};
use aws_sdk_sqs::Client;
use dl_error::{QueueError, Result};
use dl_traits::{MessageQueue, QueueDepth};
use dl_types::QueueMessage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// SQS accepts at most 10 messages per receive call.
const MAX_RECEIVE_BATCH: usize = 10;

/// Configuration for the SQS adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsQueueConfig {
    /// SQS queue URL
    pub queue_url: String,

    /// Long-polling wait time in seconds (1-20)
    pub wait_time_seconds: i32,

    /// Visibility timeout override; `None` uses the queue's own setting
    pub visibility_timeout: Option<i32>,
}

impl SqsQueueConfig {
    /// Create a new SQS configuration.
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            wait_time_seconds: 20,
            visibility_timeout: None,
        }
    }

    /// Set the long-polling wait time.
    pub fn with_wait_time(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds.clamp(1, 20);
        self
    }

    /// Set the visibility timeout applied to received messages.
    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }
}

/// Notification queue backed by AWS SQS.
pub struct SqsQueue {
    client: Client,
    config: SqsQueueConfig,
}

impl SqsQueue {
    pub fn new(client: Client, config: SqsQueueConfig) -> Self {
        Self { client, config }
    }

    /// Create the adapter from an already loaded AWS configuration.
    pub fn from_sdk_config(sdk_config: &SdkConfig, config: SqsQueueConfig) -> Self {
        Self::new(Client::new(sdk_config), config)
    }

    pub fn config(&self) -> &SqsQueueConfig {
        &self.config
    }
}

fn parse_count(value: Option<&String>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        let batch_size = max.clamp(1, MAX_RECEIVE_BATCH) as i32;

        let mut request = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(batch_size)
            .wait_time_seconds(self.config.wait_time_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount);

        if let Some(timeout) = self.config.visibility_timeout {
            request = request.visibility_timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QueueError::Receive(format!("SQS receive failed: {}", e)))?;

        let sqs_messages = response.messages.unwrap_or_default();
        debug!(count = sqs_messages.len(), "Received messages from SQS");

        let mut messages = Vec::with_capacity(sqs_messages.len());

        for msg in sqs_messages {
            let Some(receipt_handle) = msg.receipt_handle else {
                warn!(message_id = ?msg.message_id, "Message without receipt handle, skipping");
                continue;
            };

            let receive_count = msg
                .attributes
                .as_ref()
                .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);

            messages.push(
                QueueMessage::new(
                    msg.message_id.unwrap_or_default(),
                    msg.body.unwrap_or_default(),
                    receipt_handle,
                )
                .with_receive_count(receive_count),
            );
        }

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(format!("SQS delete failed: {}", e)))?;

        debug!("Deleted message from SQS");
        Ok(())
    }

    async fn depth(&self) -> Result<QueueDepth> {
        let response = self
            .client
            .get_queue_attributes()
            .queue_url(&self.config.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesNotVisible)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessagesDelayed)
            .send()
            .await
            .map_err(|e| QueueError::Attributes(format!("SQS get attributes failed: {}", e)))?;

        let attrs = response.attributes();
        let get = |name: QueueAttributeName| parse_count(attrs.and_then(|a| a.get(&name)));

        Ok(QueueDepth {
            visible: get(QueueAttributeName::ApproximateNumberOfMessages),
            in_flight: get(QueueAttributeName::ApproximateNumberOfMessagesNotVisible),
            delayed: get(QueueAttributeName::ApproximateNumberOfMessagesDelayed),
        })
    }

    fn address(&self) -> &str {
        &self.config.queue_url
    }
}
