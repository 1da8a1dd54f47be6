//! Bounded retry for fallible async operations.
//!
//! Attempts run back-to-back with no delay. The outcome is an explicit enum so
//! callers cannot confuse an exhausted budget with an empty success.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Default number of attempts for best-effort enrichment calls.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How many times to run an operation before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded; `attempts` counts it.
    Success { value: T, attempts: u32 },
    /// Every attempt failed. `last_error` is `None` only when the policy
    /// allowed zero attempts.
    Exhausted { attempts: u32, last_error: Option<E> },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The successful value, discarding attempt bookkeeping.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// `operation` receives the 1-based attempt index. Failures are logged and
/// swallowed.
pub async fn attempt<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut last_error = None;

    for index in 1..=policy.max_attempts {
        match operation(index).await {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: index,
                };
            }
            Err(e) => {
                warn!(
                    operation = label,
                    attempt = index,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Attempt failed"
                );
                last_error = Some(e);
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn first_success_short_circuits() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<&str, String> =
            attempt(&RetryPolicy::default(), "test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("done") }
            })
            .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn third_attempt_result_is_returned() {
        let calls = AtomicU32::new(0);
        let outcome = attempt(&RetryPolicy::new(3), "test", |index| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if index < 3 {
                    Err(format!("boom {index}"))
                } else {
                    Ok(index * 10)
                }
            }
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                assert_eq!(value, 30);
                assert_eq!(attempts, 3);
            }
            RetryOutcome::Exhausted { .. } => panic!("expected success"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_keeps_last_error() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<(), String> = attempt(&RetryPolicy::new(3), "test", |index| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {index}")) }
        })
        .await;

        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.as_deref(), Some("failure 3"));
            }
            RetryOutcome::Success { .. } => panic!("expected exhaustion"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_never_calls_operation() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<(), String> = attempt(&RetryPolicy::new(0), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(outcome.into_value().is_none());
    }

    #[tokio::test]
    async fn single_attempt_policy() {
        let outcome: RetryOutcome<(), &str> =
            attempt(&RetryPolicy::new(1), "test", |_| async { Err("nope") }).await;
        assert_eq!(outcome.attempts(), 1);
    }

    #[tokio::test]
    async fn empty_success_is_still_success() {
        let outcome: RetryOutcome<Option<u8>, String> =
            attempt(&RetryPolicy::default(), "test", |_| async { Ok(None) }).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.into_value(), Some(None));
    }
}
