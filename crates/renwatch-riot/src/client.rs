// SPDX-FileCopyrightText: 2026 Renwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Riot Games REST API.
//!
//! Provides [`RiotClient`] which handles host routing, the `X-Riot-Token`
//! header, percent-encoded path segments, and a single retry on transient
//! errors.

use std::time::Duration;

use renwatch_core::{Region, RenwatchError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::routing::{api_base, platform_host, regional_host};
use crate::types::{AccountDto, ApiErrorResponse, CurrentGameDto};

/// Which routing table an endpoint lives on.
#[derive(Debug, Clone, Copy)]
enum Route {
    Regional,
    Platform,
}

/// HTTP client for Riot API communication.
#[derive(Debug, Clone)]
pub struct RiotClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
    base_override: Option<String>,
}

impl RiotClient {
    /// Creates a new client authenticating with `api_key`.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, RenwatchError> {
        let mut token = HeaderValue::from_str(api_key)
            .map_err(|e| RenwatchError::Config(format!("invalid Riot API key header value: {e}")))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-Riot-Token", token);
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RenwatchError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
            base_override: None,
        })
    }

    /// Sends every request to `url` instead of the regional hosts (for wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_override = Some(url);
        self.retry_delay = Duration::from_millis(10);
        self
    }

    /// Resolve a Riot ID. `Ok(None)` when the account does not exist.
    pub async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> Result<Option<AccountDto>, RenwatchError> {
        let url = self.url(
            Route::Regional,
            region,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )?;
        self.get_json(url).await
    }

    /// The live game for a PUUID. `Ok(None)` when the player is not in one.
    pub async fn active_game(
        &self,
        puuid: &str,
        region: Region,
    ) -> Result<Option<CurrentGameDto>, RenwatchError> {
        let url = self.url(
            Route::Platform,
            region,
            &["lol", "spectator", "v5", "active-games", "by-summoner", puuid],
        )?;
        self.get_json(url).await
    }

    fn url(&self, route: Route, region: Region, segments: &[&str]) -> Result<Url, RenwatchError> {
        let base = match &self.base_override {
            Some(base) => base.clone(),
            None => match route {
                Route::Regional => api_base(regional_host(region)),
                Route::Platform => api_base(platform_host(region)),
            },
        };
        let mut url = Url::parse(&base)
            .map_err(|e| RenwatchError::Internal(format!("invalid Riot base URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| RenwatchError::Internal(format!("Riot base URL cannot be a base: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET and decode JSON, treating 404 as absence.
    ///
    /// On transient errors (429, 500, 502, 503, 504), retries once.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, RenwatchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Riot request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| RenwatchError::Upstream {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path = url.path(), "Riot response received");

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if status.is_success() {
                let body = response.text().await.map_err(|e| RenwatchError::Upstream {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed = serde_json::from_str(&body).map_err(|e| RenwatchError::Upstream {
                    message: format!("failed to parse Riot response: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return Ok(Some(parsed));
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Riot API error ({}): {}",
                    api_err.status.status_code, api_err.status.message
                ),
                Err(_) => format!("Riot API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient Riot error, will retry");
                last_error = Some(RenwatchError::Upstream {
                    message,
                    source: None,
                });
                continue;
            }

            return Err(RenwatchError::Upstream {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| RenwatchError::Upstream {
            message: "Riot request failed after retries".into(),
            source: None,
        }))
    }
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
