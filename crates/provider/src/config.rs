use std::env;
use std::time::Duration;

use crate::error::{ProviderError, Result};
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            max_concurrency: 20,
            retry: RetryPolicy::default(),
            session_id: None,
            csrf_token: None,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = env::var("FPL_BASE_URL").unwrap_or(defaults.base_url);

        let timeout = match env::var("FPL_TIMEOUT_SECS") {
            Ok(val) => Duration::from_secs(val.parse::<u64>().map_err(|_| {
                ProviderError::ConfigError(format!("FPL_TIMEOUT_SECS must be a number, got '{val}'"))
            })?),
            Err(_) => defaults.timeout,
        };

        let max_concurrency = match env::var("FPL_MAX_CONCURRENCY") {
            Ok(val) => val.parse::<usize>().map_err(|_| {
                ProviderError::ConfigError(format!(
                    "FPL_MAX_CONCURRENCY must be a number, got '{val}'"
                ))
            })?,
            Err(_) => defaults.max_concurrency,
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_concurrency: max_concurrency.max(1),
            retry: RetryPolicy::from_env()?,
            session_id: env::var("FPL_SESSION_ID").ok().filter(|v| !v.is_empty()),
            csrf_token: env::var("FPL_CSRF_TOKEN").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Cookie header for authenticated endpoints, if credentials are configured.
    pub fn cookie_header(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(session) = &self.session_id {
            parts.push(format!("sessionid={session}"));
        }
        if let Some(csrf) = &self.csrf_token {
            parts.push(format!("csrftoken={csrf}"));
        }
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header() {
        let mut config = ProviderConfig::default();
        assert_eq!(config.cookie_header(), None);

        config.session_id = Some("abc".to_string());
        config.csrf_token = Some("xyz".to_string());
        assert_eq!(
            config.cookie_header().as_deref(),
            Some("sessionid=abc; csrftoken=xyz")
        );
    }
}
