//! Retry policy for failed destination appends.

use geoload_config::shared::RetryConfig;
use std::time::Duration;

use crate::error::{ErrorKind, EtlError};

/// Outcome of consulting a [`RetryPolicy`] after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then resubmit the same rows.
    RetryAfter(Duration),
    /// Stop and surface the last error.
    GiveUp,
}

/// Decides whether and when a failed append is attempted again.
///
/// The delay after failed attempt `n` (starting at 1) is
/// `min(initial_delay * backoff_factor^(n - 1), max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    retry_non_transient: bool,
}

impl RetryPolicy {
    /// Creates a policy that retries every error forever after a fixed delay.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            initial_delay: delay,
            max_delay: delay,
            backoff_factor: 1.0,
            retry_non_transient: true,
        }
    }

    /// Limits the total number of attempts, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Grows the delay by `factor` after each failure, up to `max_delay`.
    pub fn with_backoff(mut self, factor: f64, max_delay: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_delay = max_delay;
        self
    }

    /// Controls whether errors rejected by [`is_transient_error`] are retried.
    pub fn with_retry_non_transient(mut self, retry_non_transient: bool) -> Self {
        self.retry_non_transient = retry_non_transient;
        self
    }

    /// Returns the maximum number of attempts, or [`None`] when unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Returns what to do after attempt number `attempt` failed with `error`.
    pub fn decide(&self, attempt: u32, error: &EtlError) -> RetryDecision {
        if !self.retry_non_transient && !is_transient_error(error) {
            return RetryDecision::GiveUp;
        }

        if let Some(max_attempts) = self.max_attempts
            && attempt >= max_attempts
        {
            return RetryDecision::GiveUp;
        }

        RetryDecision::RetryAfter(self.delay_after(attempt))
    }

    /// Returns the pause following failed attempt number `attempt`.
    ///
    /// A factor that drives the delay to zero or below yields no pause at all.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);

        if delay_secs <= 0.0 {
            return Duration::ZERO;
        }

        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: config.initial_delay(),
            max_delay: config.max_delay(),
            backoff_factor: config.backoff_multiplier,
            retry_non_transient: config.retry_non_transient,
        }
    }
}

/// Returns whether `error` is expected to go away on its own.
///
/// Keep this list narrow and limited to destination connectivity and availability failures. Errors
/// about credentials, permissions, missing tables or rejected data need an operator.
pub fn is_transient_error(error: &EtlError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DestinationConnectionFailed
            | ErrorKind::DestinationIoError
            | ErrorKind::DestinationError
            | ErrorKind::DestinationQueryFailed
    )
}
