use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the retry behavior of destination appends.
///
/// The defaults retry forever with a flat two second pause between attempts and treat every
/// append error as retryable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of append attempts for a single batch.
    ///
    /// When `None`, a failing batch is retried until it succeeds.
    /// Default: None
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Delay after the first failed attempt.
    ///
    /// Default: 2000ms
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the delay between attempts.
    ///
    /// Default: 60000ms
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt.
    ///
    /// Must be >= 1.0. A value of 1.0 keeps the delay flat.
    /// Default: 1.0
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Whether errors classified as permanent are retried like transient ones.
    ///
    /// Default: true
    #[serde(default = "default_retry_non_transient")]
    pub retry_non_transient: bool,
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    60000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_retry_non_transient() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            retry_non_transient: default_retry_non_transient(),
        }
    }
}

impl RetryConfig {
    /// Returns the initial delay as a [`Duration`].
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Returns the maximum delay as a [`Duration`].
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validates retry configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == Some(0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "retry.max_attempts".to_string(),
                constraint: "must be greater than 0 when set".to_string(),
            });
        }

        if !(self.backoff_multiplier >= 1.0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "retry.backoff_multiplier".to_string(),
                constraint: "must be greater than or equal to 1.0".to_string(),
            });
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ValidationError::InvalidFieldValue {
                field: "retry.max_delay_ms".to_string(),
                constraint: "must be greater than or equal to `retry.initial_delay_ms`".to_string(),
            });
        }

        Ok(())
    }
}
