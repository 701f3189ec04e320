/// Bounded retry for acquisition calls.
///
/// Both raw feeds are fetched through [`with_retry`]: the operation is
/// re-invoked after a fixed delay until it succeeds or the attempt budget
/// is exhausted. No backoff and no jitter; the caller is a one-shot
/// pipeline run, not a live service, so a blocking fixed-interval wait is
/// the whole policy.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::logging::{self, DataSource};

/// Default delay between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Attempt budget and inter-attempt delay for one acquisition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of invocations allowed, including the first.
    pub max_attempts: u32,
    /// Fixed wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

/// Runs `op` until it succeeds or the budget runs out, sleeping the fixed
/// delay between attempts. Every error is treated as transient; the only
/// terminal outcome is exhausting the budget, in which case the last
/// error is returned.
///
/// The operation is invoked exactly `max_attempts` times in the failing
/// case (a zero budget is treated as one attempt). The delay is not slept
/// after the final failure.
pub fn with_retry<T, E, F>(
    policy: &RetryPolicy,
    source: DataSource,
    what: &str,
    mut op: F,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match op() {
            Ok(value) => {
                if attempt > 1 {
                    logging::info(
                        source,
                        Some(what),
                        &format!("succeeded on attempt {}/{}", attempt, attempts),
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt < attempts {
                    logging::warn(
                        source.clone(),
                        Some(what),
                        &format!(
                            "attempt {}/{} failed: {}; retrying in {}s",
                            attempt,
                            attempts,
                            e,
                            policy.delay.as_secs()
                        ),
                    );
                    thread::sleep(policy.delay);
                } else {
                    logging::error(
                        source,
                        Some(what),
                        &format!("attempt {}/{} failed: {}; giving up", attempt, attempts, e),
                    );
                    return Err(e);
                }
            }
        }
    }

    unreachable!("retry loop exits via the final attempt's return")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_returns_first_success_without_further_attempts() {
        let mut calls = 0;
        let result: Result<i32, String> =
            with_retry(&instant_policy(100), DataSource::System, "op", || {
                calls += 1;
                Ok(42)
            });
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1, "a successful op should not be re-invoked");
    }

    #[test]
    fn test_exhausts_exactly_the_configured_attempt_count() {
        let mut calls = 0;
        let result: Result<i32, String> =
            with_retry(&instant_policy(7), DataSource::System, "op", || {
                calls += 1;
                Err("boom".to_string())
            });
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls, 7, "a failing op must be invoked exactly max_attempts times");
    }

    #[test]
    fn test_recovers_when_a_later_attempt_succeeds() {
        let mut calls = 0;
        let result: Result<&str, String> =
            with_retry(&instant_policy(5), DataSource::System, "op", || {
                calls += 1;
                if calls < 3 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            });
        assert_eq!(result, Ok("done"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_zero_budget_still_attempts_once() {
        let mut calls = 0;
        let result: Result<i32, String> =
            with_retry(&instant_policy(0), DataSource::System, "op", || {
                calls += 1;
                Err("always".to_string())
            });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_policy_matches_documented_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 100);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
