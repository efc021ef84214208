//! Fixed-backoff retries for chat-platform calls.
//!
//! Network-class transport errors are retried a bounded number of times after a
//! short constant pause; every other error is returned on the first failure.
//! A flood-wait from the platform stretches the pause to the requested delay.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::core::config;
use crate::core::error::is_network_class;

/// Determines if an error is retryable.
pub trait Retryable {
    /// Returns true if the error should be retried.
    fn is_retryable(&self) -> bool;

    /// Returns an optional hint for retry delay (e.g., from rate limit responses).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for teloxide::RequestError {
    fn is_retryable(&self) -> bool {
        is_network_class(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        if let teloxide::RequestError::RetryAfter(seconds) = self {
            Some(seconds.duration())
        } else {
            None
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
    /// Longest flood-wait honoured before the next attempt
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: config::retry::MAX_TRANSPORT_ATTEMPTS,
            backoff: config::retry::transport_backoff(),
            max_retry_after: config::retry::max_retry_after(),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Pause before retrying after `err`: the backoff, or the platform's
    /// requested delay when that is longer (capped at `max_retry_after`).
    pub fn delay_for<E: Retryable>(&self, err: &E) -> Duration {
        match err.retry_after() {
            Some(hint) => hint.min(self.max_retry_after).max(self.backoff),
            None => self.backoff,
        }
    }

    /// Runs `op`, retrying while the error reports itself as retryable.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    let delay = self.delay_for(&e);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}s",
                        label,
                        attempt,
                        self.max_attempts,
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
