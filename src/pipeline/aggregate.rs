//! Derived views over a filtered set of activities.
//!
//! Everything is computed in metres and seconds; `build_dashboard` converts
//! to the requested unit system as the last step.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::pipeline::units::format_pace;
use crate::types::activity::{Activity, ActivityType};
use crate::types::filter::{DateWindow, FilterState, Period, UnitSystem};
use crate::types::summary::{
    ActivityRow, BestMetric, Dashboard, PeriodTotal, PersonalBest, Totals, TrendMetric,
    TrendPoint, TrendSeries, Trendline, TypeShare,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Default)]
pub struct Filtered {
    pub activities: Vec<Activity>,
    pub excluded: usize,
}

/// Drops records whose id was already seen. The first occurrence wins.
pub fn dedup_by_id(activities: Vec<Activity>) -> Vec<Activity> {
    let mut seen = HashSet::with_capacity(activities.len());
    let before = activities.len();
    let unique: Vec<Activity> = activities
        .into_iter()
        .filter(|activity| seen.insert(activity.id.clone()))
        .collect();
    if unique.len() < before {
        tracing::debug!("Dropped {} duplicate activities", before - unique.len());
    }
    unique
}

pub fn filter(activities: &[Activity], filter: &FilterState) -> Filtered {
    let mut excluded = 0;
    let mut kept = Vec::with_capacity(activities.len());

    for activity in activities {
        if !activity.is_well_formed() {
            tracing::warn!(
                "Excluding malformed activity {} (distance {}, moving time {})",
                activity.id,
                activity.distance_m,
                activity.moving_time_s
            );
            excluded += 1;
            continue;
        }
        if filter
            .activity_type
            .is_some_and(|wanted| wanted != activity.activity_type)
        {
            continue;
        }
        if !filter.matches_date(activity.local_date()) {
            continue;
        }
        kept.push(activity.clone());
    }

    kept.sort_by_key(|a| a.start_date_local);
    Filtered {
        activities: kept,
        excluded,
    }
}

fn period_start(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
        Period::Month => date.with_day(1).unwrap_or(date),
    }
}

fn next_period(start: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Week => start + Duration::days(7),
        Period::Month => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start + Duration::days(31))
        }
    }
}

fn period_label(start: NaiveDate, period: Period) -> String {
    match period {
        Period::Week => {
            let week = start.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Period::Month => start.format("%Y-%m").to_string(),
    }
}

/// Running sums for one period. Averages only count records that have a
/// pace or speed.
struct Bucket {
    total: PeriodTotal,
    pace: (f64, usize),
    speed: (f64, usize),
}

impl Bucket {
    fn new(start: NaiveDate, period: Period) -> Self {
        Self {
            total: empty_period(start, period),
            pace: (0.0, 0),
            speed: (0.0, 0),
        }
    }

    fn add(&mut self, activity: &Activity) {
        self.total.distance += activity.distance_m;
        self.total.moving_time_s += activity.moving_time_s;
        self.total.elevation_gain += activity.elevation_gain_m;
        self.total.activity_count += 1;
        if let Some(pace) = activity.pace_s_per_km() {
            self.pace.0 += pace;
            self.pace.1 += 1;
        }
        if let Some(speed) = activity.speed_m_per_s() {
            self.speed.0 += speed;
            self.speed.1 += 1;
        }
    }

    fn finish(self) -> PeriodTotal {
        PeriodTotal {
            avg_pace: mean(self.pace),
            avg_speed: mean(self.speed),
            ..self.total
        }
    }
}

fn mean((sum, count): (f64, usize)) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

/// Totals per ISO week or calendar month, oldest first. Every period touched
/// by `window` is present; periods without activities are zero-filled.
pub fn period_totals(activities: &[Activity], period: Period, window: &DateWindow) -> Vec<PeriodTotal> {
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for activity in activities {
        let start = period_start(activity.local_date(), period);
        buckets
            .entry(start)
            .or_insert_with(|| Bucket::new(start, period))
            .add(activity);
    }

    let mut first = period_start(window.from, period);
    let mut last = period_start(window.to, period);
    if let Some((&earliest, _)) = buckets.first_key_value() {
        first = first.min(earliest);
    }
    if let Some((&latest, _)) = buckets.last_key_value() {
        last = last.max(latest);
    }

    let mut totals = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        totals.push(match buckets.remove(&cursor) {
            Some(bucket) => bucket.finish(),
            None => empty_period(cursor, period),
        });
        cursor = next_period(cursor, period);
    }
    totals
}

fn empty_period(start: NaiveDate, period: Period) -> PeriodTotal {
    PeriodTotal {
        period_start: start,
        label: period_label(start, period),
        distance: 0.0,
        moving_time_s: 0.0,
        elevation_gain: 0.0,
        activity_count: 0,
        avg_pace: None,
        avg_speed: None,
    }
}

/// Ordinary least squares over `(x, y)` pairs. Needs two distinct x values.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<Trendline> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, y) in points {
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean).powi(2);
    }
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    let slope_per_day = numerator / denominator;
    Some(Trendline {
        slope_per_day,
        intercept: y_mean - slope_per_day * x_mean,
    })
}

fn trend_metric(activity_type: ActivityType) -> TrendMetric {
    match activity_type {
        ActivityType::Run => TrendMetric::Pace,
        ActivityType::Ride | ActivityType::Other => TrendMetric::Speed,
    }
}

/// Pace for runs and speed for everything else, one series per type.
pub fn trend_series(activities: &[Activity]) -> Vec<TrendSeries> {
    let mut by_type: BTreeMap<ActivityType, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        by_type.entry(activity.activity_type).or_default().push(activity);
    }

    by_type
        .into_iter()
        .map(|(activity_type, mut group)| {
            group.sort_by_key(|a| a.start_date_local);
            let metric = trend_metric(activity_type);
            let points: Vec<TrendPoint> = group
                .iter()
                .filter_map(|a| {
                    let value = match metric {
                        TrendMetric::Pace => a.pace_s_per_km(),
                        TrendMetric::Speed => a.speed_m_per_s(),
                    }?;
                    Some(TrendPoint {
                        activity_id: a.id.clone(),
                        date: a.start_date_local,
                        value,
                    })
                })
                .collect();

            let trendline = points.first().and_then(|origin| {
                let xy: Vec<(f64, f64)> = points
                    .iter()
                    .map(|p| {
                        let days = (p.date - origin.date).num_seconds() as f64 / SECONDS_PER_DAY;
                        (days, p.value)
                    })
                    .collect();
                linear_fit(&xy)
            });

            TrendSeries {
                activity_type,
                metric,
                points,
                trendline,
            }
        })
        .collect()
}

/// Fastest and longest efforts per type. On equal values the earliest
/// activity keeps the record.
pub fn personal_bests(activities: &[Activity]) -> Vec<PersonalBest> {
    let mut ordered: Vec<&Activity> = activities.iter().collect();
    ordered.sort_by_key(|a| a.start_date);

    let mut by_type: BTreeMap<ActivityType, Vec<&Activity>> = BTreeMap::new();
    for activity in ordered {
        by_type.entry(activity.activity_type).or_default().push(activity);
    }

    let mut bests = Vec::new();
    for (activity_type, group) in by_type {
        if let Some((a, pace)) = best_by(&group, Activity::pace_s_per_km, |c, b| c < b) {
            bests.push(best(activity_type, BestMetric::FastestPace, a, pace));
        }
        if activity_type != ActivityType::Run {
            if let Some((a, speed)) = best_by(&group, Activity::speed_m_per_s, |c, b| c > b) {
                bests.push(best(activity_type, BestMetric::FastestSpeed, a, speed));
            }
        }
        let distance = |a: &Activity| (a.distance_m > 0.0).then_some(a.distance_m);
        if let Some((a, meters)) = best_by(&group, distance, |c, b| c > b) {
            bests.push(best(activity_type, BestMetric::LongestDistance, a, meters));
        }
    }
    bests
}

fn best_by<'a>(
    group: &[&'a Activity],
    value: impl Fn(&Activity) -> Option<f64>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<(&'a Activity, f64)> {
    let mut current: Option<(&'a Activity, f64)> = None;
    for &activity in group {
        let Some(v) = value(activity) else { continue };
        match current {
            Some((_, best)) if !better(v, best) => {}
            _ => current = Some((activity, v)),
        }
    }
    current
}

fn best(activity_type: ActivityType, metric: BestMetric, a: &Activity, value: f64) -> PersonalBest {
    PersonalBest {
        activity_type,
        metric,
        value,
        display: String::new(),
        activity_id: a.id.clone(),
        name: a.name.clone(),
        date: a.start_date_local,
    }
}

pub fn type_breakdown(activities: &[Activity]) -> Vec<TypeShare> {
    let mut by_type: BTreeMap<ActivityType, (usize, f64)> = BTreeMap::new();
    for activity in activities {
        let entry = by_type.entry(activity.activity_type).or_default();
        entry.0 += 1;
        entry.1 += activity.distance_m;
    }

    let total_count = activities.len() as f64;
    let total_distance: f64 = activities.iter().map(|a| a.distance_m).sum();

    by_type
        .into_iter()
        .map(|(activity_type, (count, distance))| TypeShare {
            activity_type,
            count,
            distance,
            count_share: share(count as f64, total_count),
            distance_share: share(distance, total_distance),
        })
        .collect()
}

fn share(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}

/// Headline totals. `weeks` is the length of the selected window.
pub fn totals(activities: &[Activity], weeks: f64) -> Totals {
    let distance: f64 = activities.iter().map(|a| a.distance_m).sum();
    Totals {
        distance,
        moving_time_s: activities.iter().map(|a| a.moving_time_s).sum(),
        elevation_gain: activities.iter().map(|a| a.elevation_gain_m).sum(),
        activity_count: activities.len(),
        avg_distance_per_week: distance / weeks.max(1.0),
    }
}

/// Full dashboard for one filter selection. `session` is the window the
/// history was loaded for; filter dates narrow it.
pub fn build_dashboard(activities: &[Activity], filter_state: &FilterState, session: DateWindow) -> Dashboard {
    let filtered = filter(activities, filter_state);
    let unit = filter_state.unit;
    let selected = &filtered.activities;
    let window = filter_state.window_within(session);

    let totals = totals(selected, window.weeks());
    let period_totals = period_totals(selected, filter_state.period, &window);
    let trends = trend_series(selected);
    let personal_bests = personal_bests(selected);
    let breakdown = type_breakdown(selected);

    Dashboard {
        unit,
        period: filter_state.period,
        distance_unit: unit.distance_label(),
        elevation_unit: unit.elevation_label(),
        totals: convert_totals(totals, unit),
        period_totals: period_totals
            .into_iter()
            .map(|p| PeriodTotal {
                distance: unit.distance(p.distance),
                elevation_gain: unit.elevation(p.elevation_gain),
                avg_pace: p.avg_pace.map(|pace| unit.pace(pace)),
                avg_speed: p.avg_speed.map(|speed| unit.speed(speed)),
                ..p
            })
            .collect(),
        trends: trends.into_iter().map(|t| convert_trend(t, unit)).collect(),
        personal_bests: personal_bests
            .into_iter()
            .map(|b| convert_best(b, unit))
            .collect(),
        breakdown: breakdown
            .into_iter()
            .map(|s| TypeShare {
                distance: unit.distance(s.distance),
                ..s
            })
            .collect(),
        excluded_records: filtered.excluded,
    }
}

fn convert_totals(totals: Totals, unit: UnitSystem) -> Totals {
    Totals {
        distance: unit.distance(totals.distance),
        elevation_gain: unit.elevation(totals.elevation_gain),
        avg_distance_per_week: unit.distance(totals.avg_distance_per_week),
        ..totals
    }
}

fn convert_value(metric: TrendMetric, unit: UnitSystem, value: f64) -> f64 {
    match metric {
        TrendMetric::Pace => unit.pace(value),
        TrendMetric::Speed => unit.speed(value),
    }
}

/// Both conversions are linear, so the fitted line converts coefficient-wise.
fn convert_trend(series: TrendSeries, unit: UnitSystem) -> TrendSeries {
    let metric = series.metric;
    TrendSeries {
        points: series
            .points
            .into_iter()
            .map(|p| TrendPoint {
                value: convert_value(metric, unit, p.value),
                ..p
            })
            .collect(),
        trendline: series.trendline.map(|t| Trendline {
            slope_per_day: convert_value(metric, unit, t.slope_per_day),
            intercept: convert_value(metric, unit, t.intercept),
        }),
        ..series
    }
}

fn convert_best(best: PersonalBest, unit: UnitSystem) -> PersonalBest {
    let (value, display) = match best.metric {
        BestMetric::FastestPace => {
            let pace = unit.pace(best.value);
            (pace, format!("{} /{}", format_pace(Some(pace)), unit.distance_label()))
        }
        BestMetric::FastestSpeed => {
            let speed = unit.speed(best.value);
            (speed, format!("{:.1} {}", speed, unit.speed_label()))
        }
        BestMetric::LongestDistance => {
            let distance = unit.distance(best.value);
            (distance, format!("{:.1} {}", distance, unit.distance_label()))
        }
    };
    PersonalBest {
        value,
        display,
        ..best
    }
}

/// Most recent activities first, for the activity table.
pub fn activity_rows(activities: &[Activity], filter_state: &FilterState, limit: usize) -> Vec<ActivityRow> {
    let unit = filter_state.unit;
    let mut selected = filter(activities, filter_state).activities;
    selected.reverse();

    selected
        .into_iter()
        .take(limit)
        .map(|a| ActivityRow {
            pace: format_pace(a.pace_s_per_km().map(|p| unit.pace(p))),
            speed: a.speed_m_per_s().map(|s| round1(unit.speed(s))),
            date: a.start_date_local.format("%d %b %Y %H:%M").to_string(),
            distance: round1(unit.distance(a.distance_m)),
            moving_time_min: (a.moving_time_s / 60.0).round(),
            elevation_gain: unit.elevation(a.elevation_gain_m).round(),
            id: a.id,
            name: a.name,
            activity_type: a.activity_type,
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
