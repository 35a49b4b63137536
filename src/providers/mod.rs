mod intervals;
pub mod parse;
mod strava;

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::config::{Config, ProviderSettings, RetrySettings};
use crate::error::ProviderError;
use crate::types::activity::Activity;

pub use intervals::IntervalsClient;
pub use strava::StravaClient;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchWindow {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
}

impl FetchWindow {
    pub fn last_weeks(weeks: u32, now: DateTime<Utc>) -> Self {
        Self {
            after: now - Duration::weeks(i64::from(weeks)),
            before: now,
        }
    }
}

pub trait ActivityProvider {
    fn name(&self) -> &'static str;

    /// Every activity inside `window`, in provider order.
    fn fetch_activities(
        &mut self,
        window: &FetchWindow,
    ) -> impl Future<Output = Result<Vec<Activity>, ProviderError>> + Send;
}

/// The configured remote source.
pub enum ProviderClient {
    Strava(StravaClient),
    Intervals(IntervalsClient),
}

impl ProviderClient {
    pub fn from_config(config: &Config) -> Result<Option<Self>, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        let client = match &config.provider {
            ProviderSettings::Strava {
                client_id,
                client_secret,
                refresh_token,
            } => Some(ProviderClient::Strava(StravaClient::new(
                http,
                config.strava_base_url.clone(),
                config.strava_token_url.clone(),
                client_id.clone(),
                client_secret.clone(),
                refresh_token.clone(),
                config.retry.clone(),
            ))),
            ProviderSettings::Intervals { athlete_id, api_key } => {
                Some(ProviderClient::Intervals(IntervalsClient::new(
                    http,
                    config.intervals_base_url.clone(),
                    athlete_id.clone(),
                    api_key.clone(),
                    config.retry.clone(),
                )))
            }
            ProviderSettings::None => None,
        };
        Ok(client)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderClient::Strava(client) => client.name(),
            ProviderClient::Intervals(client) => client.name(),
        }
    }

    pub async fn fetch_activities(&mut self, window: &FetchWindow) -> Result<Vec<Activity>, ProviderError> {
        match self {
            ProviderClient::Strava(client) => client.fetch_activities(window).await,
            ProviderClient::Intervals(client) => client.fetch_activities(window).await,
        }
    }
}

/// Sends the request built by `build`, retrying connection failures, 429 and
/// 5xx responses with exponential backoff. Any other non-success status is
/// returned as an error straight away.
pub(crate) async fn send_with_retry<F>(
    retry: &RetrySettings,
    what: &str,
    build: F,
) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = retry.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!("{} returned {}: {}", what, status, body.trim());
                Err(status_error(status, what))
            }
            Err(err) => Err(ProviderError::Unavailable(format!("{} request failed: {}", what, err))),
        };

        let err = match result {
            Err(err) if err.is_retryable() && attempt < attempts => err,
            other => return other,
        };
        let delay = retry.base_delay.saturating_mul(2u32.saturating_pow(attempt - 1));
        tracing::warn!(
            "{} (attempt {}/{}), retrying in {:?}",
            err,
            attempt,
            attempts,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

/// The response body stays in the log; messages reach users as notices.
fn status_error(status: StatusCode, what: &str) -> ProviderError {
    let message = format!("{} request failed ({})", what, status);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ProviderError::Auth(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Unavailable(message)
    } else {
        ProviderError::InvalidResponse(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_error_kinds() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "x"),
            ProviderError::Auth(_)
        ));
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "x").is_retryable());
        assert!(status_error(StatusCode::BAD_GATEWAY, "x").is_retryable());
        assert!(!status_error(StatusCode::NOT_FOUND, "x").is_retryable());
    }

    #[test]
    fn status_messages_name_request_and_status_only() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "Intervals.icu activities");
        assert_eq!(
            err.to_string(),
            "Provider unavailable: Intervals.icu activities request failed (503 Service Unavailable)"
        );
    }

    #[test]
    fn window_covers_requested_weeks() {
        let now = Utc::now();
        let window = FetchWindow::last_weeks(12, now);
        assert_eq!(window.before - window.after, Duration::weeks(12));
    }
}
