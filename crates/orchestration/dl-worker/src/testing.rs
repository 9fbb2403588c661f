//! Test doubles shared by the handler and consumer tests.

use crate::pipeline::{ObjectProcessor, ProcessReport};
use async_trait::async_trait;
use dl_error::{Result, StoreError};
use dl_traits::{FileOutcome, MetricsSink};
use dl_types::ObjectReference;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Processor that fails its first `failures` calls, then succeeds.
#[derive(Default)]
pub struct ScriptedProcessor {
    failures: u32,
    calls: AtomicU32,
    seen: Mutex<Vec<ObjectReference>>,
}

impl ScriptedProcessor {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_first(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            ..Default::default()
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Self::failing_first(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ObjectReference> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ObjectProcessor for ScriptedProcessor {
    async fn process(&self, source: &ObjectReference) -> Result<ProcessReport> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(source.clone());

        if call < self.failures {
            return Err(StoreError::NotFound(source.to_string()).into());
        }

        Ok(ProcessReport {
            output: Some(ObjectReference::new("processed", format!("{}.parquet", source.key))),
            records: 2,
            bytes_read: 100,
            bytes_written: 50,
        })
    }
}

/// Metrics sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingMetrics {
    files: Mutex<Vec<(FileOutcome, u64)>>,
    cycles: Mutex<Vec<(u64, u64)>>,
}

impl RecordingMetrics {
    pub fn files(&self) -> Vec<(FileOutcome, u64)> {
        self.files.lock().clone()
    }

    pub fn cycles(&self) -> Vec<(u64, u64)> {
        self.cycles.lock().clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record_file(&self, outcome: FileOutcome, _elapsed: Duration, source_bytes: u64) {
        self.files.lock().push((outcome, source_bytes));
    }

    fn record_poll_cycle(&self, received: u64, processed: u64) {
        self.cycles.lock().push((received, processed));
    }
}
