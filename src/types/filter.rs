use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::activity::ActivityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
}

/// Inclusive range of local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// The `weeks` whole weeks ending on `today`.
    pub fn last_weeks(weeks: u32, today: NaiveDate) -> Self {
        Self {
            from: today - Duration::days(i64::from(weeks) * 7 - 1),
            to: today,
        }
    }

    /// Length in weeks, never less than one.
    pub fn weeks(&self) -> f64 {
        let days = (self.to - self.from).num_days() + 1;
        (days as f64 / 7.0).max(1.0)
    }
}

/// User selections from the dashboard controls. Copied into every
/// recomputation, never shared between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub activity_type: Option<ActivityType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub unit: UnitSystem,
    #[serde(default)]
    pub period: Period,
}

impl FilterState {
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// The selected date range, with open ends taken from `session`.
    pub fn window_within(&self, session: DateWindow) -> DateWindow {
        let from = self.from.unwrap_or(session.from);
        let to = self.to.unwrap_or(session.to).max(from);
        DateWindow { from, to }
    }
}
