//! Synthetic activity history used when no provider is configured or the
//! provider cannot be reached.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::types::activity::{Activity, ActivityType};

const RUN_NAMES: &[&str] = &[
    "Morning Run",
    "Easy Run",
    "Tempo Run",
    "Long Run",
    "Recovery Run",
    "Interval Session",
    "Park Run",
    "Marathon Training",
    "Hill Repeats",
    "Fartlek",
];

const RIDE_NAMES: &[&str] = &[
    "Morning Ride",
    "Lunch Ride",
    "Evening Ride",
    "Weekend Ride",
    "Coffee Ride",
    "Zwift Session",
    "Hill Climb",
    "Group Ride",
    "Recovery Spin",
    "Threshold Intervals",
];

struct SportProfile {
    activity_type: ActivityType,
    names: &'static [&'static str],
    per_week: (u32, u32),
    hours: (i64, i64),
    distance_m: (f64, f64),
    /// Moving seconds per metre.
    pace_s_per_m: (f64, f64),
    elevation_m: (f64, f64),
    heartrate: (f64, f64),
    elapsed_factor: f64,
}

const RUN: SportProfile = SportProfile {
    activity_type: ActivityType::Run,
    names: RUN_NAMES,
    per_week: (3, 5),
    hours: (6, 18),
    distance_m: (5_000.0, 21_000.0),
    pace_s_per_m: (0.240, 0.300),
    elevation_m: (20.0, 200.0),
    heartrate: (140.0, 170.0),
    elapsed_factor: 1.10,
};

// 25 to 35 km/h.
const RIDE: SportProfile = SportProfile {
    activity_type: ActivityType::Ride,
    names: RIDE_NAMES,
    per_week: (1, 3),
    hours: (7, 16),
    distance_m: (20_000.0, 100_000.0),
    pace_s_per_m: (3.6 / 35.0, 3.6 / 25.0),
    elevation_m: (100.0, 1_200.0),
    heartrate: (130.0, 160.0),
    elapsed_factor: 1.15,
};

#[derive(Debug, Clone)]
pub struct SampleGenerator {
    weeks: u32,
    seed: Option<u64>,
}

impl SampleGenerator {
    pub fn new(weeks: u32) -> Self {
        Self { weeks, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Activities for the `weeks` before `now`, oldest first, ids counting up
    /// from 1. Identical seeds and `now` give identical output.
    pub fn generate(&self, now: DateTime<Utc>) -> Vec<Activity> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut activities = Vec::new();
        let mut week_start = now - Duration::weeks(i64::from(self.weeks));
        while week_start < now {
            for profile in [&RUN, &RIDE] {
                let count = rng.gen_range(profile.per_week.0..=profile.per_week.1);
                for _ in 0..count {
                    let start = week_start
                        + Duration::days(rng.gen_range(0..=6))
                        + Duration::hours(rng.gen_range(profile.hours.0..=profile.hours.1))
                        + Duration::minutes(rng.gen_range(0..=59));
                    if start > now {
                        break;
                    }
                    activities.push(synthesize(&mut rng, profile, start));
                }
            }
            week_start += Duration::weeks(1);
        }

        activities.sort_by_key(|a| a.start_date);
        for (index, activity) in activities.iter_mut().enumerate() {
            activity.id = (index + 1).to_string();
        }

        tracing::debug!(
            "Generated {} sample activities over {} weeks",
            activities.len(),
            self.weeks
        );
        activities
    }
}

fn synthesize(rng: &mut StdRng, profile: &SportProfile, start: DateTime<Utc>) -> Activity {
    let distance_m = rng.gen_range(profile.distance_m.0..profile.distance_m.1);
    let pace = rng.gen_range(profile.pace_s_per_m.0..profile.pace_s_per_m.1);
    let moving_time_s = (distance_m * pace).floor();
    let elapsed_time_s = (moving_time_s * rng.gen_range(1.0..profile.elapsed_factor)).floor();
    let name = profile
        .names
        .choose(rng)
        .copied()
        .unwrap_or("Workout")
        .to_string();

    Activity {
        id: String::new(),
        name,
        activity_type: profile.activity_type,
        start_date: start,
        start_date_local: start.naive_utc(),
        distance_m,
        moving_time_s,
        elapsed_time_s,
        elevation_gain_m: rng.gen_range(profile.elevation_m.0..profile.elevation_m.1),
        average_heartrate: Some(rng.gen_range(profile.heartrate.0..profile.heartrate.1)),
    }
}
