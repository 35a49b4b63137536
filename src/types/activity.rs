use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Run,
    Ride,
    Other,
}

impl ActivityType {
    /// Maps provider sport names onto the three tracked types.
    pub fn from_provider(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "run" | "trailrun" | "virtualrun" => ActivityType::Run,
            "ride" | "virtualride" | "gravelride" | "mountainbikeride" | "ebikeride" => {
                ActivityType::Ride
            }
            _ => ActivityType::Other,
        }
    }

    pub fn from_query(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "run" => Some(ActivityType::Run),
            "ride" => Some(ActivityType::Ride),
            "other" => Some(ActivityType::Other),
            _ => None,
        }
    }
}

/// One logged workout, normalized across providers. Distances are metres and
/// durations seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub activity_type: ActivityType,
    pub start_date: DateTime<Utc>,
    pub start_date_local: NaiveDateTime,
    pub distance_m: f64,
    pub moving_time_s: f64,
    pub elapsed_time_s: f64,
    pub elevation_gain_m: f64,
    pub average_heartrate: Option<f64>,
}

impl Activity {
    /// Seconds per kilometre. `None` when the activity covers no distance or time.
    pub fn pace_s_per_km(&self) -> Option<f64> {
        if self.distance_m > 0.0 && self.moving_time_s > 0.0 {
            Some(self.moving_time_s / (self.distance_m / 1000.0))
        } else {
            None
        }
    }

    /// Metres per second. `None` when the activity covers no distance or time.
    pub fn speed_m_per_s(&self) -> Option<f64> {
        if self.distance_m > 0.0 && self.moving_time_s > 0.0 {
            Some(self.distance_m / self.moving_time_s)
        } else {
            None
        }
    }

    pub fn local_date(&self) -> NaiveDate {
        self.start_date_local.date()
    }

    pub fn is_well_formed(&self) -> bool {
        [self.distance_m, self.moving_time_s, self.elevation_gain_m]
            .iter()
            .all(|v| v.is_finite())
            && self.distance_m >= 0.0
            && self.moving_time_s >= 0.0
    }
}
