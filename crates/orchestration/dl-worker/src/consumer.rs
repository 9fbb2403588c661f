//! The poll loop.

use crate::config::WorkerConfig;
use crate::handler::MessageHandler;
use crate::ledger::DedupLedger;
use crate::parser::MessageParser;
use crate::pipeline::ObjectProcessor;
use crate::retry::RetryPolicy;
use crate::stats::{StatsSnapshot, StopReason, WorkerStats};
use dl_error::{DlError, Result};
use dl_traits::{MessageQueue, MetricsSink, NoopMetrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument, Span};

/// Messages requested per receive call.
const RECEIVE_BATCH: usize = 1;

/// Long-polls a queue and hands each message to a [`MessageHandler`].
///
/// The loop stops after `max_empty_polls` consecutive empty receives, or when
/// the cancellation token fires. Cancellation is observed while waiting on
/// the queue, while idling between polls and during retry backoff; a
/// processing attempt already running is allowed to finish.
pub struct QueueConsumer<Q, P> {
    queue: Q,
    handler: MessageHandler<P>,
    poll_interval: Duration,
    max_empty_polls: Option<u32>,
    metrics: Arc<dyn MetricsSink>,
    stats: Arc<WorkerStats>,
    span: Span,
    cancel: CancellationToken,
}

impl<Q: MessageQueue, P: ObjectProcessor> QueueConsumer<Q, P> {
    /// Build a consumer from a validated configuration.
    pub fn new(config: &WorkerConfig, queue: Q, processor: P) -> Result<Self> {
        config.validate().map_err(DlError::Config)?;

        let stats = Arc::new(WorkerStats::new());
        let handler = MessageHandler::new(
            MessageParser::new(&config.raw_bucket),
            RetryPolicy::new(config.max_retries, config.retry_backoff),
            processor,
        )
        .with_stats(stats.clone());

        let span = info_span!(
            "worker",
            worker_id = %config.worker_id,
            queue = %queue.address()
        );

        Ok(Self {
            queue,
            handler,
            poll_interval: config.poll_interval,
            max_empty_polls: config.max_empty_polls,
            metrics: Arc::new(NoopMetrics),
            stats,
            span,
            cancel: CancellationToken::new(),
        })
    }

    /// Send per-file and per-cycle measurements to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.handler = self.handler.with_metrics(metrics.clone());
        self.metrics = metrics;
        self
    }

    /// Run inside `span` instead of the default `worker` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Stop when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> &Arc<WorkerStats> {
        &self.stats
    }

    pub fn ledger(&self) -> &DedupLedger {
        self.handler.ledger()
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Poll until the empty-poll limit is reached or cancellation.
    ///
    /// Failures never end the loop: a failed receive is logged and followed
    /// by the normal idle wait, and a failed message is left on the queue.
    pub async fn run(&mut self) -> StatsSnapshot {
        let span = self.span.clone();
        let reason = self.poll_loop().instrument(span.clone()).await;

        self.stats.complete(reason);
        let snapshot = self.stats.snapshot();

        span.in_scope(|| {
            info!(
                reason = ?reason,
                polls = snapshot.polls,
                messages = snapshot.messages_received,
                succeeded = snapshot.files_succeeded,
                failed = snapshot.files_failed,
                duplicates = snapshot.duplicates_skipped,
                records = snapshot.records_written,
                "Worker stopped"
            );
        });

        snapshot
    }

    async fn poll_loop(&mut self) -> StopReason {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            max_empty_polls = ?self.max_empty_polls,
            "Starting worker"
        );

        let mut empty_polls: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            self.stats.record_poll();

            let received = tokio::select! {
                _ = self.cancel.cancelled() => return StopReason::Cancelled,
                received = self.queue.receive(RECEIVE_BATCH) => received,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    error!(error = %e, "Failed to receive from queue");
                    self.stats.record_receive_error();
                    if !self.idle().await {
                        return StopReason::Cancelled;
                    }
                    continue;
                }
            };

            if messages.is_empty() {
                empty_polls += 1;
                self.stats.record_empty_poll();
                debug!(empty_polls = empty_polls, "No messages received");

                if self.max_empty_polls.is_some_and(|max| empty_polls >= max) {
                    info!(empty_polls = empty_polls, "Queue drained, stopping");
                    return StopReason::EmptyPolls;
                }

                if !self.idle().await {
                    return StopReason::Cancelled;
                }
                continue;
            }

            empty_polls = 0;
            let received_count = messages.len() as u64;
            let mut processed = 0u64;

            for message in &messages {
                self.stats.record_message();
                let outcome = self
                    .handler
                    .handle(&self.queue, message, &self.cancel)
                    .await;
                if outcome.is_success() {
                    processed += 1;
                }
            }

            self.metrics.record_poll_cycle(received_count, processed);
        }
    }

    /// Wait one poll interval. Returns false when cancelled first.
    async fn idle(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(self.poll_interval) => true,
        }
    }
}
