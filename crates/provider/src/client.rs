use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::models::{
    Bootstrap, ClassicLeagueResponse, EntryPicks, FixtureData, H2hLeagueResponse,
    H2hMatchesResponse, LiveEvent,
};
use crate::retry::RetryPolicy;

/// Thin JSON client over the fantasy game's public API.
pub struct FplClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl FplClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ProviderError::ConfigError(format!("invalid cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    /// GET `path` and decode it, retrying throttling, server errors and transport failures.
    ///
    /// Returns `Ok(None)` on 404, e.g. an entry with no picks yet. Any other client error is
    /// returned as is.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff(attempt - 1)).await;
            }

            let response = match self.client.get(&url).timeout(self.timeout).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, attempt = attempt + 1, error = %e, "Request failed");
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(url = %url, attempt = attempt + 1, error = %e, "Reading body failed");
                        continue;
                    }
                };
                return Ok(Some(serde_json::from_slice(&body)?));
            }

            if RetryPolicy::is_retryable(status) {
                warn!(url = %url, attempt = attempt + 1, status = status.as_u16(), "Retryable status");
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                debug!(url = %url, "No data at endpoint");
                return Ok(None);
            }

            return Err(ProviderError::StatusError {
                status: status.as_u16(),
                url,
            });
        }

        Err(ProviderError::Exhausted { url, attempts })
    }

    /// Like [`get_json`](Self::get_json) but a missing resource is an error.
    async fn require<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json(path)
            .await?
            .ok_or_else(|| ProviderError::MissingData(path.to_string()))
    }

    pub async fn bootstrap(&self) -> Result<Bootstrap> {
        self.require("bootstrap-static/").await
    }

    pub async fn fixtures(&self, gameweek: i32) -> Result<Vec<FixtureData>> {
        self.require(&format!("fixtures/?event={gameweek}")).await
    }

    pub async fn live(&self, gameweek: i32) -> Result<LiveEvent> {
        self.require(&format!("event/{gameweek}/live/")).await
    }

    pub async fn picks(&self, entry: i64, gameweek: i32) -> Result<Option<EntryPicks>> {
        self.get_json(&format!("entry/{entry}/event/{gameweek}/picks/"))
            .await
    }

    pub async fn classic_standings_page(
        &self,
        league_id: i64,
        page: u32,
    ) -> Result<ClassicLeagueResponse> {
        self.require(&format!(
            "leagues-classic/{league_id}/standings/?page_new_entries=1&page_standings={page}"
        ))
        .await
    }

    pub async fn h2h_standings_page(&self, league_id: i64, page: u32) -> Result<H2hLeagueResponse> {
        self.require(&format!(
            "leagues-h2h/{league_id}/standings/?page_new_entries=1&page_standings={page}"
        ))
        .await
    }

    pub async fn h2h_matches_page(
        &self,
        league_id: i64,
        gameweek: i32,
        page: u32,
    ) -> Result<H2hMatchesResponse> {
        self.require(&format!(
            "leagues-h2h-matches/league/{league_id}/?event={gameweek}&page={page}"
        ))
        .await
    }
}
