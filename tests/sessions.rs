use axum::{body::to_bytes, http::Request, Router};
use serde_json::Value;
use stridedash::{config::Config, routes, state::AppState};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(Config::offline());
    Router::new()
        .merge(routes::health::router())
        .merge(routes::sessions::router())
        .with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (axum::http::StatusCode, Value) {
    send_raw(app, method, uri, body.map(|json| json.to_string())).await
}

async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<String>) -> (axum::http::StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    let body = match body {
        Some(raw) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(raw)
        }
        None => axum::body::Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_session(app: &Router) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/sessions",
        Some(serde_json::json!({"weeks": 8, "seed": 7})),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["source"], "sample");
    assert!(json["notice"].as_str().is_some());
    assert_eq!(json["weeks"], 8);
    assert!(json["activity_count"].as_u64().unwrap_or(0) > 0);
    json["session_id"].as_str().expect("session id").to_string()
}

#[tokio::test]
async fn session_without_body_uses_default_window() {
    let app = app();
    let (status, json) = send(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    let weeks = json["weeks"].as_u64().expect("weeks");
    assert!((4..=52).contains(&weeks));
}

#[tokio::test]
async fn malformed_session_body_is_rejected() {
    let app = app();
    for body in [r#"{"weeks":"x"}"#, r#"{"foo":1}"#, "not json"] {
        let (status, json) = send_raw(&app, "POST", "/api/sessions", Some(body.to_string())).await;
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST, "body {body}");
        assert!(json["error"].as_str().is_some());
    }

    let (status, _) = send_raw(&app, "POST", "/api/sessions", Some(String::new())).await;
    assert_eq!(status, axum::http::StatusCode::OK);
}

#[tokio::test]
async fn dashboard_totals_match_period_totals() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(&app, "GET", &format!("/api/sessions/{session_id}/dashboard"), None).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["distance_unit"], "km");
    assert_eq!(json["period"], "week");

    assert_eq!(json["elevation_unit"], "m");

    let grand_total = json["totals"]["distance"].as_f64().expect("total distance");
    let periods = json["period_totals"].as_array().expect("period totals");
    let grouped: f64 = periods.iter().filter_map(|p| p["distance"].as_f64()).sum();
    assert!((grand_total - grouped).abs() < 1e-6);
    assert!(periods.len() >= 8);

    let per_week = json["totals"]["avg_distance_per_week"].as_f64().expect("average");
    assert!((per_week * 8.0 - grand_total).abs() < 1e-6);

    let types: Vec<&str> = json["breakdown"]
        .as_array()
        .expect("breakdown")
        .iter()
        .filter_map(|s| s["activity_type"].as_str())
        .collect();
    assert_eq!(types, ["run", "ride"]);
}

#[tokio::test]
async fn dashboard_filters_type_unit_and_period() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/sessions/{session_id}/dashboard?activity_type=ride&unit=imperial&period=month"),
        None,
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["distance_unit"], "mi");
    assert_eq!(json["elevation_unit"], "ft");
    assert_eq!(json["period"], "month");
    let breakdown = json["breakdown"].as_array().expect("breakdown");
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0]["activity_type"], "ride");
    assert!(json["personal_bests"]
        .as_array()
        .expect("bests")
        .iter()
        .all(|b| b["activity_type"] == "ride"));
}

#[tokio::test]
async fn empty_date_range_is_not_an_error() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/sessions/{session_id}/dashboard?from=1990-01-01&to=1990-01-31"),
        None,
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["totals"]["activity_count"], 0);
    let periods = json["period_totals"].as_array().expect("period totals");
    let labels: Vec<&str> = periods.iter().filter_map(|p| p["label"].as_str()).collect();
    assert_eq!(labels, ["1990-W01", "1990-W02", "1990-W03", "1990-W04", "1990-W05"]);
    assert!(periods
        .iter()
        .all(|p| p["activity_count"] == 0 && p["avg_pace"].is_null()));
}

#[tokio::test]
async fn invalid_filters_are_rejected() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/sessions/{session_id}/dashboard?activity_type=swim"),
        None,
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap_or("").contains("swim"));
}

#[tokio::test]
async fn activities_table_is_limited_and_newest_first() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/sessions/{session_id}/activities?limit=5&activity_type=run"),
        None,
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["elevation_unit"], "m");
    let rows = json["activities"].as_array().expect("rows");
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r["activity_type"] == "run"));
    assert!(rows.iter().all(|r| r["pace"].as_str().is_some_and(|p| p.contains(':'))));
    let ids: Vec<u64> = rows
        .iter()
        .filter_map(|r| r["id"].as_str().and_then(|id| id.parse().ok()))
        .collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/sessions/missing/dashboard", None).await;
    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/sessions/missing/refresh", None).await;
    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_keeps_session_id() {
    let app = app();
    let session_id = create_session(&app).await;

    let (status, json) = send(&app, "POST", &format!("/api/sessions/{session_id}/refresh"), None).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(json["session_id"], session_id.as_str());
    assert_eq!(json["weeks"], 8);
}
