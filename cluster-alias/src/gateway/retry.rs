//! Bounded retry for transactional writes under contention.

use std::time::Duration;

use serde::Deserialize;

use crate::error::StoreError;

/// How a gateway retries a write transaction that hit transient contention.
///
/// Backoff doubles from `initial_backoff_ms` per attempt and is capped at
/// `max_backoff_ms`. Non-transient errors are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 50,
            max_backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Run `op`, sleeping the calling thread between transient failures.
    pub fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Result<T, StoreError>,
    {
        self.run_with_sleep(op, std::thread::sleep)
    }

    /// Run `op` with an injected sleep, retrying transient failures.
    ///
    /// Returns [`StoreError::RetriesExhausted`] once the attempt budget is
    /// spent on transient errors.
    pub fn run_with_sleep<T, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, StoreError>
    where
        F: FnMut() -> Result<T, StoreError>,
        S: FnMut(Duration),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    if attempt >= max_attempts {
                        return Err(StoreError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Write contention, retrying transaction"
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
