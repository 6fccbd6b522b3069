//! Bounded retry with exponential backoff for upstream calls.
//!
//! Attempts are 1-indexed. After failed attempt `n` the caller sleeps
//! `base_delay * 2^(n-1)`, so with the default 1s base the waits are 1s, then 2s.
//! Permanent failures (bad status, malformed payload) are returned immediately.

use std::{future::Future, time::Duration};
use tracing::{debug, warn};

use crate::UvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum Failure {
    /// Transport error, timeout or a 5xx-class status: worth another try.
    Transient(anyhow::Error),
    /// Will fail the same way again.
    Permanent(anyhow::Error),
}

impl Failure {
    fn into_inner(self) -> anyhow::Error {
        match self {
            Failure::Transient(e) | Failure::Permanent(e) => e,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy's attempts are used up.
///
/// `op` receives the current attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, UvError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "upstream call succeeded after retries");
                }
                return Ok(value);
            }
            Err(Failure::Transient(err)) if attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "upstream call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(failure) => {
                return Err(UvError::Upstream { attempts: attempt, source: failure.into_inner() });
            }
        }
    }
}
