//! Bounded retry with backoff for transient infrastructure failures.
//!
//! Only read operations are retried; writes inside the completion protocol
//! either succeed as a unit or escalate, never loop.

use std::time::Duration;

use peopleforge_employee::{DirectoryError, HistoryError};

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed,
    /// Exponential backoff: base * 2^(attempt-1), capped at `max_delay`.
    Exponential,
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(50), Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// A policy with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// A policy with fixed delays.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// A policy with exponential backoff.
    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Delay before the given attempt number (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Errors that may be retried after a pause.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for DirectoryError {
    fn is_transient(&self) -> bool {
        matches!(self, DirectoryError::Unavailable(_))
    }
}

impl Transient for HistoryError {
    fn is_transient(&self) -> bool {
        matches!(self, HistoryError::Unavailable(_))
    }
}

/// Run a read operation, retrying transient failures with backoff.
///
/// Deterministic failures (not found, validation) return immediately.
pub fn retry_read<T, E, F>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Transient + core::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && policy.should_retry(attempt) => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation = label,
                    attempt,
                    error = %err,
                    "transient failure, retrying after {delay:?}"
                );
                std::thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let policy = RetryPolicy::exponential(
            5,
            Duration::from_millis(100),
            Duration::from_millis(300),
        );

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(300));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(500));

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[test]
    fn retry_read_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));

        let result: Result<u32, DirectoryError> = retry_read(&policy, "test read", || {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DirectoryError::Unavailable("blip".to_string()))
            } else {
                Ok(7)
            }
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_read_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(2, Duration::from_millis(1));

        let result: Result<u32, DirectoryError> = retry_read(&policy, "test read", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DirectoryError::Unavailable("down".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn deterministic_errors_are_never_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));

        let result: Result<u32, DirectoryError> = retry_read(&policy, "test read", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DirectoryError::NotFound)
        });

        assert_eq!(result.unwrap_err(), DirectoryError::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
