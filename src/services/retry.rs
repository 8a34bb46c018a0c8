//! Bounded exponential backoff for transient completion failures.

use std::future::Future;
use std::time::Duration;

use crate::services::completion::CompletionError;

/// Total attempts, the first one included.
pub const MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based): 100ms, 200ms, 400ms...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent. The backoff is awaited inline; the caller's request
/// waits for it.
///
/// Returns the last error when attempts run out.
pub async fn retry_transient<F, Fut, T>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, CompletionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CompletionError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Completion succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let backoff = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient completion failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}
