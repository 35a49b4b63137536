use serde_json::Value;

use crate::config::RetrySettings;
use crate::error::ProviderError;
use crate::providers::parse::parse_page;
use crate::providers::{send_with_retry, ActivityProvider, FetchWindow};
use crate::types::activity::Activity;

/// Intervals.icu uses HTTP basic auth with this fixed user name.
const API_KEY_USER: &str = "API_KEY";

pub struct IntervalsClient {
    http: reqwest::Client,
    base_url: String,
    athlete_id: String,
    api_key: String,
    retry: RetrySettings,
}

impl IntervalsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        athlete_id: String,
        api_key: String,
        retry: RetrySettings,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            athlete_id,
            api_key,
            retry,
        }
    }
}

impl ActivityProvider for IntervalsClient {
    fn name(&self) -> &'static str {
        "intervals"
    }

    async fn fetch_activities(&mut self, window: &FetchWindow) -> Result<Vec<Activity>, ProviderError> {
        let url = format!("{}/athlete/{}/activities", self.base_url, self.athlete_id);
        let query = [
            ("oldest", window.after.format("%Y-%m-%d").to_string()),
            ("newest", window.before.format("%Y-%m-%d").to_string()),
        ];

        let response = send_with_retry(&self.retry, "Intervals.icu activities", || {
            self.http
                .get(&url)
                .basic_auth(API_KEY_USER, Some(&self.api_key))
                .header("Accept", "application/json")
                .query(&query)
        })
        .await?;

        let records: Vec<Value> = response.json().await.map_err(|err| {
            ProviderError::InvalidResponse(format!("Invalid Intervals.icu activities response: {}", err))
        })?;

        let activities = parse_page(records, "intervals");
        tracing::info!("Fetched {} activities from Intervals.icu", activities.len());
        Ok(activities)
    }
}
