//! Bounded retry with a fixed backoff.
//!
//! Every error is retried the same way; there is no classification into
//! retryable and permanent failures. The backoff sleep is the only
//! suspension point between attempts and ends early on cancellation.

use dl_error::DlError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Attempt budget and backoff for one unit of work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

/// All attempts failed, or cancellation interrupted the backoff.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// Attempts actually made
    pub attempts: u32,

    /// Error of the final attempt
    pub last_error: DlError,

    /// True when cancellation cut the attempts short
    pub cancelled: bool,
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. `file_id` and the
    /// queue's `receive_count` for the message identify the work in log lines.
    pub async fn run<F, Fut, T>(
        &self,
        file_id: &str,
        receive_count: u32,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = dl_error::Result<T>>,
    {
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= self.max_attempts {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: error,
                    cancelled: false,
                });
            }

            warn!(
                file_id = file_id,
                receive_count = receive_count,
                attempt = attempt,
                max_attempts = self.max_attempts,
                stage = ?error.stage(),
                error = %error,
                backoff_ms = self.backoff.as_millis() as u64,
                "Attempt failed, backing off"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: error,
                        cancelled: true,
                    });
                }
                _ = sleep(self.backoff) => {}
            }

            attempt += 1;
        }
    }
}
