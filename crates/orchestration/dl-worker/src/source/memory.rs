//! In-process queue.

use async_trait::async_trait;
use dl_error::{QueueError, Result};
use dl_traits::{MessageQueue, QueueDepth};
use dl_types::QueueMessage;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// In-flight entries kept when no visibility timeout is set.
pub const DEFAULT_IN_FLIGHT_LIMIT: usize = 10_000;

#[derive(Debug)]
struct InFlight {
    message: QueueMessage,
    received_at: Instant,
}

/// FIFO queue held in memory.
///
/// Without a visibility timeout, received messages are never redelivered and
/// only the newest [`DEFAULT_IN_FLIGHT_LIMIT`] undeleted ones are tracked.
/// With one, undeleted messages return to the back of the queue once the
/// timeout passes, with their receive count bumped. Deletions are recorded so
/// callers can check what was acknowledged. Failures can be injected for
/// the receive and delete paths.
#[derive(Debug)]
pub struct MemoryQueue {
    address: String,
    pending: Mutex<VecDeque<QueueMessage>>,
    in_flight: Mutex<VecDeque<InFlight>>,
    deleted: Mutex<Vec<String>>,
    visibility_timeout: Option<Duration>,
    in_flight_limit: usize,
    polls: AtomicU64,
    next_id: AtomicU64,
    failing_receives: AtomicU32,
    failing_deletes: AtomicU32,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new("memory://queue")
    }
}

impl MemoryQueue {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            pending: Mutex::new(VecDeque::new()),
            in_flight: Mutex::new(VecDeque::new()),
            deleted: Mutex::new(Vec::new()),
            visibility_timeout: None,
            in_flight_limit: DEFAULT_IN_FLIGHT_LIMIT,
            polls: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            failing_receives: AtomicU32::new(0),
            failing_deletes: AtomicU32::new(0),
        }
    }

    /// Redeliver undeleted messages after `timeout`.
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = Some(timeout);
        self
    }

    /// Cap on tracked in-flight messages; the oldest are forgotten first.
    pub fn with_in_flight_limit(mut self, limit: usize) -> Self {
        self.in_flight_limit = limit.max(1);
        self
    }

    /// Enqueue a message as-is.
    pub fn push(&self, message: QueueMessage) {
        self.pending.lock().push_back(message);
    }

    /// Enqueue `body` with generated id and receipt handle. Returns the receipt handle.
    pub fn push_body(&self, body: impl Into<String>) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let receipt = format!("receipt-{}", n);
        self.push(QueueMessage::new(format!("msg-{}", n), body, receipt.clone()));
        receipt
    }

    /// Make the next `count` receive calls fail.
    pub fn fail_next_receives(&self, count: u32) {
        self.failing_receives.store(count, Ordering::Relaxed);
    }

    /// Make the next `count` delete calls fail.
    pub fn fail_next_deletes(&self, count: u32) {
        self.failing_deletes.store(count, Ordering::Relaxed);
    }

    /// Receive calls made so far, failed ones included.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Receipt handles deleted so far, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Messages not yet received.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Move in-flight messages whose visibility window has passed back to
    /// the queue.
    fn expire_in_flight(&self) {
        let Some(timeout) = self.visibility_timeout else {
            return;
        };

        let mut in_flight = self.in_flight.lock();
        let mut pending = self.pending.lock();
        while let Some(entry) = in_flight.front() {
            if entry.received_at.elapsed() < timeout {
                break;
            }
            if let Some(InFlight { mut message, .. }) = in_flight.pop_front() {
                message.receive_count += 1;
                debug!(message_id = %message.id, "Visibility timeout expired, message visible again");
                pending.push_back(message);
            }
        }
    }
}

/// Decrement `counter` if positive; true when a failure should be injected.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn receive(&self, max: usize) -> Result<Vec<QueueMessage>> {
        self.polls.fetch_add(1, Ordering::Relaxed);

        if take_failure(&self.failing_receives) {
            return Err(QueueError::Receive("injected receive failure".to_string()).into());
        }

        self.expire_in_flight();

        let messages: Vec<QueueMessage> = {
            let mut pending = self.pending.lock();
            let count = max.min(pending.len());
            pending.drain(..count).collect()
        };

        let received_at = Instant::now();
        let mut in_flight = self.in_flight.lock();
        in_flight.extend(messages.iter().map(|m| InFlight {
            message: m.clone(),
            received_at,
        }));
        if self.visibility_timeout.is_none() {
            let excess = in_flight.len().saturating_sub(self.in_flight_limit);
            in_flight.drain(..excess);
        }

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        if take_failure(&self.failing_deletes) {
            return Err(QueueError::Delete("injected delete failure".to_string()).into());
        }

        self.in_flight
            .lock()
            .retain(|entry| entry.message.receipt_handle != receipt_handle);
        self.deleted.lock().push(receipt_handle.to_string());
        Ok(())
    }

    async fn depth(&self) -> Result<QueueDepth> {
        self.expire_in_flight();
        Ok(QueueDepth {
            visible: self.pending.lock().len() as u64,
            in_flight: self.in_flight.lock().len() as u64,
            delayed: 0,
        })
    }

    fn address(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_receive_and_delete() {
        let queue = MemoryQueue::default();
        let first = queue.push_body("a.jsonl");
        queue.push_body("b.jsonl");

        let received = queue.receive(1).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].body, "a.jsonl");
        assert_eq!(received[0].receipt_handle, first);

        let depth = queue.depth().await.unwrap();
        assert_eq!(depth.visible, 1);
        assert_eq!(depth.in_flight, 1);

        queue.delete(&first).await.unwrap();
        assert_eq!(queue.deleted(), vec![first]);
        assert_eq!(queue.depth().await.unwrap().in_flight, 0);
        assert_eq!(queue.polls(), 1);
    }

    #[tokio::test]
    async fn test_empty_receive() {
        let queue = MemoryQueue::default();

        assert!(queue.receive(1).await.unwrap().is_empty());
        assert!(queue.depth().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let queue = MemoryQueue::default();
        queue.push_body("a.jsonl");
        queue.fail_next_receives(1);
        queue.fail_next_deletes(1);

        assert!(queue.receive(1).await.is_err());
        let received = queue.receive(1).await.unwrap();
        assert_eq!(queue.polls(), 2);

        let receipt = &received[0].receipt_handle;
        assert!(queue.delete(receipt).await.is_err());
        assert!(queue.delete(receipt).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeleted_message_redelivered_after_visibility_timeout() {
        let queue = MemoryQueue::default().with_visibility_timeout(Duration::from_secs(30));
        queue.push_body("a.jsonl");

        let first = queue.receive(1).await.unwrap();
        assert_eq!(first[0].receive_count, 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(queue.receive(1).await.unwrap().is_empty());
        assert_eq!(queue.depth().await.unwrap().in_flight, 1);

        tokio::time::advance(Duration::from_secs(25)).await;
        let depth = queue.depth().await.unwrap();
        assert_eq!(depth.visible, 1);
        assert_eq!(depth.in_flight, 0);

        let second = queue.receive(1).await.unwrap();
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[0].receive_count, 2);
        assert_eq!(queue.depth().await.unwrap().in_flight, 1);
    }

    #[tokio::test]
    async fn test_in_flight_bounded_without_visibility_timeout() {
        let queue = MemoryQueue::default().with_in_flight_limit(2);
        for body in ["a.jsonl", "b.jsonl", "c.jsonl"] {
            queue.push_body(body);
        }

        let received = queue.receive(3).await.unwrap();
        assert_eq!(received.len(), 3);

        let depth = queue.depth().await.unwrap();
        assert_eq!(depth.visible, 0);
        assert_eq!(depth.in_flight, 2);

        queue.delete(&received[2].receipt_handle).await.unwrap();
        assert_eq!(queue.depth().await.unwrap().in_flight, 1);
    }
}
