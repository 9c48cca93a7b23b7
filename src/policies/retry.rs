//! In-place retry of a failed chunk, with fixed or capped-exponential delay.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::config::BatchConfig;
use crate::error::ErrorKind;

/// Immutable retry decision object.
///
/// `should_retry` is a pure function over (error kind, attempt number); the
/// 1-based attempt counter is owned by the chunk loop and reset for every
/// chunk, so retries never leak across chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    retryable: HashSet<ErrorKind>,
    max_attempts: u32,
    delay: Duration,
    /// When set, the delay doubles each attempt and is capped here.
    max_delay: Option<Duration>,
}

impl RetryPolicy {
    /// Policy that never retries; the engine default.
    pub fn none() -> Self {
        Self {
            retryable: HashSet::new(),
            max_attempts: 1,
            delay: Duration::ZERO,
            max_delay: None,
        }
    }

    /// Policy allowing up to `max_attempts` total attempts per chunk.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::none()
        }
    }

    /// Policy derived from engine configuration: transient failures only,
    /// exponential backoff capped at the configured maximum.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.retry_limit)
            .retry_on(ErrorKind::Transient)
            .with_delay(Duration::from_millis(config.retry_delay_ms))
            .with_backoff(Duration::from_millis(config.backoff_max_ms))
    }

    /// Mark an error kind as retryable. Cancellation is refused even if
    /// registered here.
    #[must_use]
    pub fn retry_on(mut self, kind: ErrorKind) -> Self {
        self.retryable.insert(kind);
        self
    }

    /// Fixed delay applied before every retried attempt.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Switch to exponential backoff: the base delay doubles per attempt,
    /// capped at `max_delay`.
    #[must_use]
    pub fn with_backoff(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Whether the chunk should be re-run in place after its `attempt`-th
    /// failure (1-based).
    pub fn should_retry(&self, kind: ErrorKind, attempt: u32) -> bool {
        if kind == ErrorKind::Cancelled {
            return false;
        }
        if self.retryable.is_empty() || self.max_attempts <= 1 {
            return false;
        }
        attempt < self.max_attempts && self.retryable.contains(&kind)
    }

    /// Delay applied before the attempt following the `attempt`-th failure.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.max_delay {
            Some(max) => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor).min(max)
            }
            None => self.delay,
        }
    }

    /// Await the configured delay before the next attempt.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting before retry");
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_retryable_kinds_means_no_retry() {
        let policy = RetryPolicy::new(5);
        assert!(!policy.should_retry(ErrorKind::Transient, 1));
    }

    #[test]
    fn single_attempt_budget_means_no_retry() {
        let policy = RetryPolicy::new(1).retry_on(ErrorKind::Transient);
        assert!(!policy.should_retry(ErrorKind::Transient, 1));
    }

    #[test]
    fn retries_until_attempts_exhausted() {
        let policy = RetryPolicy::new(3).retry_on(ErrorKind::Transient);
        assert!(policy.should_retry(ErrorKind::Transient, 1));
        assert!(policy.should_retry(ErrorKind::Transient, 2));
        assert!(!policy.should_retry(ErrorKind::Transient, 3));
    }

    #[test]
    fn unregistered_kinds_are_not_retried() {
        let policy = RetryPolicy::new(3).retry_on(ErrorKind::Transient);
        assert!(!policy.should_retry(ErrorKind::Data, 1));
    }

    #[test]
    fn cancellation_is_never_retried() {
        let policy = RetryPolicy::new(3).retry_on(ErrorKind::Cancelled);
        assert!(!policy.should_retry(ErrorKind::Cancelled, 1));
    }

    #[test]
    fn fixed_delay_is_constant_across_attempts() {
        let policy = RetryPolicy::new(4)
            .retry_on(ErrorKind::Transient)
            .with_delay(Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(3), Duration::from_millis(250));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(6)
            .retry_on(ErrorKind::Transient)
            .with_delay(Duration::from_millis(100))
            .with_backoff(Duration::from_millis(350));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(5), Duration::from_millis(350));
    }
}
