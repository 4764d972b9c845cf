//! forge::retry
//!
//! Retry/backoff resilience layer for remote calls.
//!
//! # Policy
//!
//! Every network-bound forge operation runs through [`with_retry`]:
//!
//! - **Client errors** (4xx other than 429, plus not-found and conflict)
//!   are re-thrown immediately. Repeating the call cannot change the
//!   outcome.
//! - **Rate limits** (403/429 with exhausted quota) are honored exactly:
//!   when the API reports a positive reset wait under 60 seconds, the
//!   layer sleeps precisely that long and retries without consuming a
//!   retry slot. Longer or unknown waits fail with the typed rate-limit
//!   error so the caller can decide.
//! - **Transient failures** (5xx, transport errors) are retried with
//!   bounded exponential backoff: `min(base_delay * 2^attempt, max_delay)`.
//!
//! Exhausting the retry budget re-throws the last observed error; nothing
//! is ever swallowed.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use super::traits::ForgeError;

/// Rate-limit waits at or beyond this bound are not slept through.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Bounded retry policy for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of invocations of the operation.
    pub max_retries: u32,
    /// Backoff starting point.
    pub base_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given retry (1-based), capped at
    /// `max_delay`.
    fn backoff_delay(&self, retry: u32) -> Duration {
        // 2^(retry-1), saturating well past any sane configuration.
        let exponent = (retry.saturating_sub(1)).min(16);
        let factor = 1u32 << exponent;
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `operation` under the retry policy.
///
/// The operation is a closure so each attempt issues a fresh request.
/// Returns the first success, or the last classified error once the
/// policy gives up.
///
/// # Example
///
/// ```ignore
/// let policy = RetryPolicy::default();
/// let response = with_retry(&policy, || self.send_read_file(path, git_ref)).await?;
/// ```
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ForgeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ForgeError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),

            Err(ForgeError::RateLimited {
                retry_in: Some(wait),
            }) if wait > Duration::ZERO && wait < MAX_RATE_LIMIT_WAIT => {
                // The API said exactly when capacity returns; honor that
                // wait instead of backing off, and keep the retry budget.
                tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limited, sleeping until reset");
                sleep(wait).await;
            }

            Err(err) if err.is_transient() => {
                attempt += 1;
                if attempt >= policy.max_retries {
                    tracing::warn!(attempts = attempt, error = %err, "retries exhausted");
                    return Err(err);
                }
                let delay = policy.backoff_delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, backing off"
                );
                sleep(delay).await;
            }

            // Client errors, conflicts, not-found, and rate limits without
            // a usable reset wait will not change on repeat.
            Err(err) => return Err(err),
        }
    }
}
