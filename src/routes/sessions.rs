use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::clamp_weeks;
use crate::error::AppError;
use crate::pipeline::{aggregate, load};
use crate::state::{AppState, DataSource, Session};
use crate::types::activity::ActivityType;
use crate::types::filter::{FilterState, Period, UnitSystem};
use crate::types::summary::{ActivityRow, Dashboard};

const DEFAULT_TABLE_ROWS: usize = 20;
const MAX_TABLE_ROWS: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:session_id/dashboard", get(dashboard))
        .route("/api/sessions/:session_id/activities", get(activities))
        .route("/api/sessions/:session_id/refresh", post(refresh))
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CreateSessionRequest {
    weeks: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    source: DataSource,
    notice: Option<String>,
    weeks: u32,
    activity_count: usize,
}

#[derive(Debug, Deserialize, Default)]
struct FilterQuery {
    activity_type: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    unit: Option<UnitSystem>,
    period: Option<Period>,
    limit: Option<usize>,
}

impl FilterQuery {
    fn filter_state(&self) -> Result<FilterState, AppError> {
        let activity_type = match self.activity_type.as_deref().map(str::trim) {
            None | Some("") | Some("all") | Some("All") => None,
            Some(raw) => Some(ActivityType::from_query(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown activity type: {}", raw))
            })?),
        };
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::BadRequest(format!(
                    "Date range is reversed: {} is after {}",
                    from, to
                )));
            }
        }

        Ok(FilterState {
            activity_type,
            from: self.from,
            to: self.to,
            unit: self.unit.unwrap_or_default(),
            period: self.period.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    session_id: String,
    source: DataSource,
    notice: Option<String>,
    weeks: u32,
    #[serde(flatten)]
    dashboard: Dashboard,
}

#[derive(Debug, Serialize)]
struct ActivitiesResponse {
    distance_unit: &'static str,
    elevation_unit: &'static str,
    activities: Vec<ActivityRow>,
}

fn session_response(session_id: String, session: &Session) -> SessionResponse {
    SessionResponse {
        session_id,
        source: session.source,
        notice: session.notice.clone(),
        weeks: session.weeks,
        activity_count: session.activities.len(),
    }
}

fn lookup(state: &AppState, session_id: &str) -> Result<Session, AppError> {
    state
        .get(session_id)
        .ok_or_else(|| AppError::NotFound(session_id.to_string()))
}

/// An empty body takes the defaults; anything else must be a valid request.
fn parse_create_request(body: &[u8]) -> Result<CreateSessionRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateSessionRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid session request: {}", e)))
}

async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionResponse>, AppError> {
    let request = parse_create_request(&body)?;
    let weeks = clamp_weeks(request.weeks.unwrap_or(state.config().default_weeks));

    let session = load::load_session(&state, weeks, request.seed).await;
    let session_id = Uuid::new_v4().to_string();
    let response = session_response(session_id.clone(), &session);

    tracing::info!(
        "Created session {} with {} activities from {:?}",
        session_id,
        response.activity_count,
        session.source
    );
    state.insert(session_id, session);

    Ok(Json(response))
}

async fn refresh(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let previous = lookup(&state, &session_id)?;
    let session = load::load_session(&state, previous.weeks, previous.seed).await;
    let response = session_response(session_id.clone(), &session);

    tracing::info!(
        "Refreshed session {}: {} -> {} activities",
        session_id,
        previous.activities.len(),
        response.activity_count
    );
    state.insert(session_id, session);

    Ok(Json(response))
}

async fn dashboard(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let filter_state = query.filter_state()?;
    let session = lookup(&state, &session_id)?;

    let dashboard = aggregate::build_dashboard(&session.activities, &filter_state, session.window);
    if dashboard.excluded_records > 0 {
        tracing::warn!(
            "Session {}: {} malformed activities excluded",
            session_id,
            dashboard.excluded_records
        );
    }

    Ok(Json(DashboardResponse {
        session_id,
        source: session.source,
        notice: session.notice,
        weeks: session.weeks,
        dashboard,
    }))
}

async fn activities(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ActivitiesResponse>, AppError> {
    let filter_state = query.filter_state()?;
    let limit = query.limit.unwrap_or(DEFAULT_TABLE_ROWS).min(MAX_TABLE_ROWS);
    let session = lookup(&state, &session_id)?;

    Ok(Json(ActivitiesResponse {
        distance_unit: filter_state.unit.distance_label(),
        elevation_unit: filter_state.unit.elevation_label(),
        activities: aggregate::activity_rows(&session.activities, &filter_state, limit),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_all_to_no_type_filter() {
        let query = FilterQuery {
            activity_type: Some("all".to_string()),
            ..FilterQuery::default()
        };
        assert_eq!(query.filter_state().unwrap().activity_type, None);
    }

    #[test]
    fn create_request_rejects_bad_bodies() {
        let request = parse_create_request(b"").unwrap();
        assert_eq!(request.weeks, None);
        assert_eq!(parse_create_request(br#"{"weeks": 6}"#).unwrap().weeks, Some(6));
        assert!(matches!(
            parse_create_request(br#"{"weeks":"x"}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_create_request(br#"{"foo":1}"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn query_rejects_unknown_type_and_reversed_range() {
        let unknown = FilterQuery {
            activity_type: Some("swim".to_string()),
            ..FilterQuery::default()
        };
        assert!(matches!(unknown.filter_state(), Err(AppError::BadRequest(_))));

        let reversed = FilterQuery {
            from: NaiveDate::from_ymd_opt(2025, 3, 10),
            to: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..FilterQuery::default()
        };
        assert!(matches!(reversed.filter_state(), Err(AppError::BadRequest(_))));
    }
}
