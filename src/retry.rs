//! Retry-after-delay for network operations
//!
//! Archive downloads and release-metadata fetches get exactly one retry after a fixed
//! delay. Every call site goes through [`with_retry`] so the policy is uniform.

use std::thread;
use std::time::Duration;

use crate::error::{AlbtError, Result};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn once_after(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            delay,
        }
    }

    #[cfg(test)]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Default retryability: only transient network categories
pub fn is_transient(err: &AlbtError) -> bool {
    err.category().is_transient()
}

/// Execute an operation, retrying while `is_retryable` accepts the error
///
/// # Errors
///
/// Returns the last error once attempts are exhausted or the error is not retryable.
pub fn with_retry<T, F, R>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
    R: Fn(&AlbtError) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= policy.max_attempts || !is_retryable(&e) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "operation failed, retrying in {:?}",
                    policy.delay
                );
                thread::sleep(policy.delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick() -> RetryPolicy {
        RetryPolicy::once_after(Duration::ZERO)
    }

    fn transient() -> AlbtError {
        AlbtError::NetworkUnavailable {
            url: "u".to_string(),
            reason: "refused".to_string(),
        }
    }

    #[test]
    fn test_default_is_one_retry_after_five_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_succeeds_first_try() {
        let calls = Cell::new(0);
        let result = with_retry(
            "op",
            &quick(),
            || {
                calls.set(calls.get() + 1);
                Ok(7)
            },
            is_transient,
        );
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_exactly_once_on_transient() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(
            "op",
            &quick(),
            || {
                calls.set(calls.get() + 1);
                Err(transient())
            },
            is_transient,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_second_attempt_can_succeed() {
        let calls = Cell::new(0);
        let result = with_retry(
            "op",
            &quick(),
            || {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    Err(transient())
                } else {
                    Ok("ok")
                }
            },
            is_transient,
        );
        assert_eq!(result.unwrap(), "ok");
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(
            "op",
            &quick(),
            || {
                calls.set(calls.get() + 1);
                Err(AlbtError::NotFound {
                    resource: "x".to_string(),
                })
            },
            is_transient,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_no_retry_policy() {
        let calls = Cell::new(0);
        let _: Result<()> = with_retry(
            "op",
            &RetryPolicy::no_retry(),
            || {
                calls.set(calls.get() + 1);
                Err(transient())
            },
            is_transient,
        );
        assert_eq!(calls.get(), 1);
    }
}
