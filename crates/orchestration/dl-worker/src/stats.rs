//! Statistics for worker runs.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Why the consumer loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The configured number of consecutive empty polls was reached
    EmptyPolls,

    /// The cancellation token fired
    Cancelled,
}

/// Counters collected during a worker run.
///
/// Updated by the consumer and handler; readable from other tasks while the
/// run is in progress.
#[derive(Debug, Default)]
pub struct WorkerStats {
    started_at: Option<DateTime<Utc>>,
    completed_at: Mutex<Option<DateTime<Utc>>>,
    stop_reason: Mutex<Option<StopReason>>,

    /// Receive calls made, failed ones included
    polls: AtomicU64,

    /// Receive calls that returned no messages
    empty_polls: AtomicU64,

    /// Receive calls that returned an error
    receive_errors: AtomicU64,

    /// Messages handed to the handler
    messages_received: AtomicU64,

    files_succeeded: AtomicU64,
    files_failed: AtomicU64,

    /// Deliveries acknowledged without work because the file was already claimed
    duplicates_skipped: AtomicU64,

    /// Acknowledgements that failed after successful processing
    ack_failures: AtomicU64,

    records_written: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
}

impl WorkerStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete.
    pub fn complete(&self, reason: StopReason) {
        *self.completed_at.lock() = Some(Utc::now());
        *self.stop_reason.lock() = Some(reason);
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully processed file.
    pub fn record_file_success(&self, records: u64, bytes_read: u64, bytes_written: u64) {
        self.files_succeeded.fetch_add(1, Ordering::Relaxed);
        self.records_written.fetch_add(records, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes_read, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes_written, Ordering::Relaxed);
    }

    pub fn record_file_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub fn files_succeeded(&self) -> u64 {
        self.files_succeeded.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed.load(Ordering::Relaxed)
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: *self.completed_at.lock(),
            stop_reason: *self.stop_reason.lock(),
            polls: self.polls(),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            files_succeeded: self.files_succeeded(),
            files_failed: self.files_failed(),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

/// A serializable snapshot of worker statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<StopReason>,
    pub polls: u64,
    pub empty_polls: u64,
    pub receive_errors: u64,
    pub messages_received: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,
    pub duplicates_skipped: u64,
    pub ack_failures: u64,
    pub records_written: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl StatsSnapshot {
    /// Total duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Duration of the run in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration()
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
    }

    /// True when at least one file exhausted its attempts.
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}
