use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::activity::ActivityType;
use crate::types::filter::{Period, UnitSystem};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub period_start: NaiveDate,
    pub label: String,
    pub distance: f64,
    pub moving_time_s: f64,
    pub elevation_gain: f64,
    pub activity_count: usize,
    /// Mean pace of the period's records that have one, seconds per distance unit.
    pub avg_pace: Option<f64>,
    /// Mean speed of the period's records that have one.
    pub avg_speed: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Pace,
    Speed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub activity_id: String,
    pub date: NaiveDateTime,
    pub value: f64,
}

/// Least-squares fit of the metric against days since the first point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub slope_per_day: f64,
    pub intercept: f64,
}

impl Trendline {
    pub fn value_at(&self, days: f64) -> f64 {
        self.intercept + self.slope_per_day * days
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub activity_type: ActivityType,
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
    pub trendline: Option<Trendline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestMetric {
    FastestPace,
    FastestSpeed,
    LongestDistance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub activity_type: ActivityType,
    pub metric: BestMetric,
    pub value: f64,
    pub display: String,
    pub activity_id: String,
    pub name: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeShare {
    pub activity_type: ActivityType,
    pub count: usize,
    pub distance: f64,
    pub count_share: f64,
    pub distance_share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub distance: f64,
    pub moving_time_s: f64,
    pub elevation_gain: f64,
    pub activity_count: usize,
    pub avg_distance_per_week: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub unit: UnitSystem,
    pub period: Period,
    pub distance_unit: &'static str,
    pub elevation_unit: &'static str,
    pub totals: Totals,
    pub period_totals: Vec<PeriodTotal>,
    pub trends: Vec<TrendSeries>,
    pub personal_bests: Vec<PersonalBest>,
    pub breakdown: Vec<TypeShare>,
    pub excluded_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    pub name: String,
    pub activity_type: ActivityType,
    pub date: String,
    pub distance: f64,
    pub moving_time_min: f64,
    pub elevation_gain: f64,
    pub pace: String,
    pub speed: Option<f64>,
}
