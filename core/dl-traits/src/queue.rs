//! Message queue trait and related types.

use async_trait::async_trait;
use dl_error::Result;
use dl_types::QueueMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trait for notification queue backends.
///
/// Delivery is at-least-once. A message that is received but never deleted
/// becomes visible again once the backend's visibility timeout expires;
/// that redelivery policy belongs to the backend, not to the worker.
///
/// # Message Flow
///
/// 1. The consumer calls [`receive`](MessageQueue::receive), which may block
///    for the backend's long-poll wait
/// 2. After successful handling it calls [`delete`](MessageQueue::delete)
/// 3. On failure it does nothing and the message is redelivered later
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receives up to `max` messages (long-polling).
    ///
    /// Returns an empty vector when nothing arrived within the wait time.
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>>;

    /// Deletes a message, acknowledging it as handled.
    async fn delete(&self, receipt_handle: &str) -> Result<()>;

    /// Gets approximate queue depth (for monitoring).
    async fn depth(&self) -> Result<QueueDepth>;

    /// Human-readable queue address for logs.
    fn address(&self) -> &str;
}

#[async_trait]
impl<T: MessageQueue + ?Sized> MessageQueue for Arc<T> {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        (**self).receive(max).await
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        (**self).delete(receipt_handle).await
    }

    async fn depth(&self) -> Result<QueueDepth> {
        (**self).depth().await
    }

    fn address(&self) -> &str {
        (**self).address()
    }
}

/// Queue depth information for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    /// Messages available for receipt
    pub visible: u64,

    /// Messages received but not yet deleted or timed out
    pub in_flight: u64,

    /// Messages not yet visible because of a delivery delay
    pub delayed: u64,
}

impl QueueDepth {
    /// True if nothing is visible, in flight, or delayed.
    pub fn is_empty(&self) -> bool {
        self.visible == 0 && self.in_flight == 0 && self.delayed == 0
    }
}
