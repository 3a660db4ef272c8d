use std::env;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{ProviderError, Result};

/// Backoff schedule for provider requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per request, first try included.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Reads `FPL_RETRY_MAX` and `FPL_RETRY_BACKOFF_MS`, keeping defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut policy = Self::default();

        if let Some(val) = var("FPL_RETRY_MAX") {
            let attempts = val.parse::<u32>().map_err(|_| {
                ProviderError::ConfigError(format!("FPL_RETRY_MAX must be a number, got '{val}'"))
            })?;
            policy.max_attempts = attempts.max(1);
        }

        if let Some(val) = var("FPL_RETRY_BACKOFF_MS") {
            let ms = val.parse::<u64>().map_err(|_| {
                ProviderError::ConfigError(format!(
                    "FPL_RETRY_BACKOFF_MS must be a number, got '{val}'"
                ))
            })?;
            policy.initial_backoff = Duration::from_millis(ms);
        }

        Ok(policy)
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry as i32);
        let delay = self.initial_backoff.mul_f64(factor);
        delay.min(self.max_backoff)
    }

    pub fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}
