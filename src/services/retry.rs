//! Resilient invocation core
//!
//! Wraps a provider call with classification-aware retry and exponential
//! backoff. Only transient failures (rate limits, timeouts, connection
//! failures, 5xx) are retried; client errors propagate immediately.

use crate::utils::error::AppResult;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy for provider calls
///
/// A pure value with no mutable state; the same policy can back any number
/// of concurrent calls, each of which tracks its own attempt counter and
/// backoff locally.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Multiplier applied to the delay after each retry
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, initial_backoff: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            multiplier,
        }
    }

    /// Backoff delay inserted after the given zero-based attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(millis as u64)
    }
}

/// Execute an operation with retry on transient failure
///
/// Invokes `operation` up to `policy.max_attempts` times. A success is
/// returned immediately. A transient failure triggers an exponential
/// backoff sleep and another attempt; a permanent failure propagates at
/// once with no sleep. After exhaustion the last failure propagates.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_transient() {
                    error!(
                        "{} failed permanently on attempt {}: {}",
                        operation_name,
                        attempt + 1,
                        err
                    );
                    return Err(err);
                }

                let classification = err
                    .failure_kind()
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "unclassified".to_string());
                last_error = Some(err);

                // No sleep after the final attempt
                if attempt + 1 < policy.max_attempts {
                    let delay = policy.backoff_for(attempt);
                    warn!(
                        "{} failed ({}), retrying in {:?} (attempt {}/{})",
                        operation_name,
                        classification,
                        delay,
                        attempt + 1,
                        policy.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    let last_classification = last_error
        .as_ref()
        .and_then(|err| err.failure_kind())
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "unclassified".to_string());
    error!(
        "All {} attempts exhausted for {} (last failure: {})",
        policy.max_attempts, operation_name, last_classification
    );

    // max_attempts >= 1 guarantees at least one recorded error
    Err(last_error.unwrap_or_else(|| {
        crate::utils::error::AppError::Provider {
            kind: crate::utils::error::FailureKind::Unclassified,
            message: format!("{} produced no attempts", operation_name),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn test_backoff_sequence() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), 2.0);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_with_fractional_multiplier() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), 1.5);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(2250));
    }
}
