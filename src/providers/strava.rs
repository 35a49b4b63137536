use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::config::RetrySettings;
use crate::error::ProviderError;
use crate::providers::parse::parse_page;
use crate::providers::{send_with_retry, ActivityProvider, FetchWindow};
use crate::types::activity::Activity;

const PAGE_SIZE: u32 = 200;
const MAX_PAGES: u32 = 50;
/// Refresh this many seconds before Strava's stated expiry.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: i64,
}

/// Strava v3 client authenticated with a long-lived refresh token.
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    access: Option<AccessToken>,
    retry: RetrySettings,
}

impl StravaClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        retry: RetrySettings,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url,
            client_id,
            client_secret,
            refresh_token,
            access: None,
            retry,
        }
    }

    async fn access_token(&mut self) -> Result<String, ProviderError> {
        let now = Utc::now().timestamp();
        if let Some(access) = &self.access {
            if now + EXPIRY_MARGIN_SECONDS < access.expires_at {
                return Ok(access.token.clone());
            }
        }

        tracing::info!("Refreshing Strava access token");
        let refresh_token = self.refresh_token.clone();
        let response = send_with_retry(&self.retry, "Strava token refresh", || {
            self.http.post(&self.token_url).form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
        })
        .await
        .map_err(|err| match err {
            ProviderError::InvalidResponse(message) => ProviderError::Auth(message),
            other => other,
        })?;

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(format!("Invalid Strava token response: {}", err)))?;

        let expires_at = payload
            .expires_at
            .or_else(|| payload.expires_in.map(|secs| now + secs))
            .unwrap_or(now + 6 * 3600);
        if let Some(rotated) = payload.refresh_token {
            if rotated != self.refresh_token {
                tracing::debug!("Strava rotated the refresh token");
                self.refresh_token = rotated;
            }
        }
        self.access = Some(AccessToken {
            token: payload.access_token.clone(),
            expires_at,
        });
        Ok(payload.access_token)
    }

    async fn fetch_page(
        &mut self,
        window: &FetchWindow,
        page: u32,
    ) -> Result<Vec<Value>, ProviderError> {
        let token = self.access_token().await?;
        let url = format!("{}/athlete/activities", self.base_url);
        let query = [
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("after", window.after.timestamp().to_string()),
            ("before", window.before.timestamp().to_string()),
        ];

        let response = send_with_retry(&self.retry, "Strava activities", || {
            self.http.get(&url).bearer_auth(&token).query(&query)
        })
        .await?;

        response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidResponse(format!("Invalid Strava activities response: {}", err)))
    }
}

impl ActivityProvider for StravaClient {
    fn name(&self) -> &'static str {
        "strava"
    }

    async fn fetch_activities(&mut self, window: &FetchWindow) -> Result<Vec<Activity>, ProviderError> {
        let mut activities = Vec::new();
        for page in 1..=MAX_PAGES {
            let records = self.fetch_page(window, page).await?;
            if records.is_empty() {
                break;
            }
            tracing::debug!("Strava page {} returned {} activities", page, records.len());
            activities.extend(parse_page(records, "strava"));
            if page == MAX_PAGES {
                tracing::warn!("Stopped paging Strava activities after {} pages", MAX_PAGES);
            }
        }
        tracing::info!("Fetched {} activities from Strava", activities.len());
        Ok(activities)
    }
}
