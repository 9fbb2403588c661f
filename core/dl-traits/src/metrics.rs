//! Metrics sink trait.

use std::time::Duration;

/// Final outcome of handling one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Read, transformed and written (or skipped as empty)
    Success,

    /// All attempts failed
    Error,
}

/// Receiver of worker counters and timings.
///
/// Emission is best-effort: methods return nothing, and implementations must
/// swallow their own failures so that metrics can never fail processing.
pub trait MetricsSink: Send + Sync {
    /// Records the outcome of one file, with its processing time and source size.
    fn record_file(&self, outcome: FileOutcome, elapsed: Duration, source_bytes: u64);

    /// Records a poll cycle that yielded messages.
    fn record_poll_cycle(&self, received: u64, processed: u64);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_file(&self, _outcome: FileOutcome, _elapsed: Duration, _source_bytes: u64) {}

    fn record_poll_cycle(&self, _received: u64, _processed: u64) {}
}
