//! Typed mapping from provider activity JSON to [`Activity`].
//!
//! Each record is decoded on its own so one bad entry does not sink the page.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RecordError;
use crate::types::activity::{Activity, ActivityType};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Fields shared by Strava v3 `SummaryActivity` and Intervals.icu activities.
#[derive(Debug, Deserialize)]
struct RawActivity {
    id: RawId,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    activity_type: Option<String>,
    #[serde(default)]
    sport_type: Option<String>,
    start_date: Option<String>,
    start_date_local: Option<String>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    moving_time: Option<f64>,
    #[serde(default)]
    elapsed_time: Option<f64>,
    #[serde(default)]
    total_elevation_gain: Option<f64>,
    #[serde(default)]
    average_heartrate: Option<f64>,
}

pub fn parse_activity(value: Value) -> Result<Activity, RecordError> {
    let raw: RawActivity =
        serde_json::from_value(value).map_err(|e| RecordError::Malformed(e.to_string()))?;
    let id = raw.id.into_string();

    let kind = raw
        .sport_type
        .as_deref()
        .or(raw.activity_type.as_deref())
        .map(ActivityType::from_provider)
        .unwrap_or(ActivityType::Other);

    let start_date_local = raw
        .start_date_local
        .as_deref()
        .and_then(parse_local)
        .or_else(|| raw.start_date.as_deref().and_then(parse_utc).map(|d| d.naive_utc()))
        .ok_or_else(|| RecordError::Malformed(format!("activity {id} has no start date")))?;
    let start_date = raw
        .start_date
        .as_deref()
        .and_then(parse_utc)
        .unwrap_or_else(|| start_date_local.and_utc());

    let distance_m = raw.distance.unwrap_or(0.0);
    let moving_time_s = raw.moving_time.or(raw.elapsed_time).unwrap_or(0.0);
    let elapsed_time_s = raw.elapsed_time.unwrap_or(moving_time_s);

    for (field, value) in [
        ("distance", distance_m),
        ("moving time", moving_time_s),
        ("elapsed time", elapsed_time_s),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(RecordError::OutOfRange { id, field });
        }
    }

    Ok(Activity {
        name: raw.name.unwrap_or_else(|| "Activity".to_string()),
        id,
        activity_type: kind,
        start_date,
        start_date_local,
        distance_m,
        moving_time_s,
        elapsed_time_s,
        elevation_gain_m: raw.total_elevation_gain.unwrap_or(0.0).max(0.0),
        average_heartrate: raw.average_heartrate,
    })
}

/// Parses a page of records, logging and skipping the ones that fail.
pub fn parse_page(page: Vec<Value>, provider: &str) -> Vec<Activity> {
    page.into_iter()
        .filter_map(|value| match parse_activity(value) {
            Ok(activity) => Some(activity),
            Err(err) => {
                tracing::warn!("Skipping {} record: {}", provider, err);
                None
            }
        })
        .collect()
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok()
}

/// Strava suffixes local times with `Z`; Intervals.icu sends them bare.
fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    raw.trim_end_matches('Z').parse::<NaiveDateTime>().ok()
}
