//! Per-message handling: dedup gate, bounded retry, acknowledgement.

use crate::ledger::DedupLedger;
use crate::parser::MessageParser;
use crate::pipeline::{ObjectProcessor, ProcessReport};
use crate::retry::RetryPolicy;
use crate::stats::WorkerStats;
use dl_error::ProcessingStage;
use dl_traits::{FileOutcome, MessageQueue, MetricsSink, NoopMetrics};
use dl_types::QueueMessage;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Processed and acknowledged
    Processed,

    /// File already claimed by this process; acknowledged without work
    Duplicate,

    /// Every attempt failed; left on the queue for redelivery
    Failed,
}

impl HandleOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, HandleOutcome::Failed)
    }
}

/// Handles messages one at a time.
///
/// Owns the [`DedupLedger`]; handling takes `&mut self`, so there is never
/// more than one message in flight per handler.
pub struct MessageHandler<P> {
    parser: MessageParser,
    ledger: DedupLedger,
    retry: RetryPolicy,
    processor: P,
    metrics: Arc<dyn MetricsSink>,
    stats: Arc<WorkerStats>,
}

impl<P: ObjectProcessor> MessageHandler<P> {
    pub fn new(parser: MessageParser, retry: RetryPolicy, processor: P) -> Self {
        Self {
            parser,
            ledger: DedupLedger::new(),
            retry,
            processor,
            metrics: Arc::new(NoopMetrics),
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DedupLedger {
        &mut self.ledger
    }

    /// Handle one message end to end.
    ///
    /// On success (or a duplicate) the message is deleted from `queue`. A
    /// failed delete after successful processing is logged and the outcome
    /// stays [`HandleOutcome::Processed`]; the redelivery will be caught by
    /// the ledger. On failure the ledger claim is released and the message
    /// is left alone.
    pub async fn handle<Q>(
        &mut self,
        queue: &Q,
        message: &QueueMessage,
        cancel: &CancellationToken,
    ) -> HandleOutcome
    where
        Q: MessageQueue + ?Sized,
    {
        let source = self.parser.resolve(message);
        let file_id = source.file_id();

        if !self.ledger.claim(&file_id) {
            info!(
                file_id = %file_id,
                receive_count = message.receive_count,
                "File already handled, acknowledging without reprocessing"
            );
            self.stats.record_duplicate();
            self.acknowledge(queue, message, &file_id).await;
            return HandleOutcome::Duplicate;
        }

        info!(
            bucket = %source.bucket,
            key = %source.key,
            receive_count = message.receive_count,
            "Processing file"
        );

        let start = Instant::now();
        let processor = &self.processor;
        let max_attempts = self.retry.max_attempts();
        let source_ref = &source;
        let receive_count = message.receive_count;

        let result = self
            .retry
            .run(&file_id, receive_count, cancel, move |attempt| {
                debug!(
                    file_id = %source_ref.file_id(),
                    receive_count = receive_count,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    "Attempting"
                );
                processor.process(source_ref)
            })
            .await;

        match result {
            Ok(report) => {
                self.record_success(&report, start);
                self.acknowledge(queue, message, &file_id).await;
                HandleOutcome::Processed
            }
            Err(exhausted) => {
                self.ledger.release(&file_id);
                self.stats.record_file_failure();
                self.metrics
                    .record_file(FileOutcome::Error, start.elapsed(), 0);

                warn!(
                    file_id = %file_id,
                    receive_count = receive_count,
                    attempts = exhausted.attempts,
                    max_attempts = max_attempts,
                    cancelled = exhausted.cancelled,
                    stage = ?exhausted.last_error.stage(),
                    error = %exhausted.last_error,
                    "Giving up on file, message left for redelivery"
                );
                HandleOutcome::Failed
            }
        }
    }

    fn record_success(&self, report: &ProcessReport, start: Instant) {
        self.stats
            .record_file_success(report.records, report.bytes_read, report.bytes_written);
        self.metrics
            .record_file(FileOutcome::Success, start.elapsed(), report.bytes_read);
    }

    async fn acknowledge<Q>(&self, queue: &Q, message: &QueueMessage, file_id: &str)
    where
        Q: MessageQueue + ?Sized,
    {
        match queue.delete(&message.receipt_handle).await {
            Ok(()) => debug!(file_id = file_id, message_id = %message.id, "Message acknowledged"),
            Err(e) => {
                self.stats.record_ack_failure();
                error!(
                    file_id = file_id,
                    message_id = %message.id,
                    stage = %ProcessingStage::Ack,
                    error = %e,
                    "Failed to delete message"
                );
            }
        }
    }
}
