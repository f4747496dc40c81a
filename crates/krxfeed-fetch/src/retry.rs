//! Retry with exponential backoff.

use krxfeed_types::KrxError;
use std::time::Duration;
use tracing::warn;

/// Outcome of one failed attempt.
#[derive(Debug)]
pub enum Failure {
    /// Connection-level failure or retryable status; another attempt may succeed.
    Retryable(String),
    /// Failure no retry can fix; surfaced immediately.
    Fatal(KrxError),
}

/// Bounds and pacing of retries.
///
/// Only connection failures and the configured statuses are retried. Other
/// statuses and decode failures bypass the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: u32,
    retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(300),
            multiplier: 2,
            retryable_statuses: vec![500, 502, 504],
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt bound and first delay, doubling per attempt.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            ..Self::default()
        }
    }

    /// Sets the backoff growth factor.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Replaces the set of statuses worth retrying.
    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retryable_statuses = statuses.into();
        self
    }

    /// Returns the maximum number of attempts, first included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if a response with this status should be retried.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Returns the delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Runs `attempt` until it succeeds, fails fatally, or the attempt bound is reached.
    ///
    /// The closure receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the fatal error of an attempt, or [`KrxError::TransientNetwork`]
    /// once every attempt failed with a retryable failure.
    pub fn run<T>(
        &self,
        mut attempt: impl FnMut(u32) -> Result<T, Failure>,
    ) -> Result<T, KrxError> {
        let mut number = 1;
        loop {
            match attempt(number) {
                Ok(value) => return Ok(value),
                Err(Failure::Fatal(err)) => return Err(err),
                Err(Failure::Retryable(reason)) if number < self.max_attempts => {
                    let delay = self.backoff(number);
                    warn!(
                        attempt = number,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "retrying request"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    number += 1;
                }
                Err(Failure::Retryable(reason)) => {
                    return Err(KrxError::TransientNetwork {
                        attempts: number,
                        reason,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> RetryPolicy {
        RetryPolicy::new(5, Duration::ZERO)
    }

    #[test]
    fn test_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert!(policy.is_retryable_status(500));
        assert!(policy.is_retryable_status(502));
        assert!(policy.is_retryable_status(504));
        assert!(!policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(404));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(600));
        assert_eq!(policy.backoff(3), Duration::from_millis(1200));
        assert_eq!(policy.backoff(4), Duration::from_millis(2400));
    }

    #[test]
    fn test_succeeds_on_last_attempt() {
        let mut calls = 0;
        let result = instant().run(|attempt| {
            calls += 1;
            if attempt < 5 {
                Err(Failure::Retryable("HTTP 502".into()))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = instant().run(|_| {
            calls += 1;
            Err(Failure::Retryable("HTTP 500".into()))
        });
        assert!(matches!(
            result,
            Err(KrxError::TransientNetwork { attempts: 5, .. })
        ));
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_fatal_bypasses_retry() {
        let mut calls = 0;
        let result: Result<(), _> = instant().run(|_| {
            calls += 1;
            Err(Failure::Fatal(KrxError::Rejected { status: 403 }))
        });
        assert!(matches!(result, Err(KrxError::Rejected { status: 403 })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
