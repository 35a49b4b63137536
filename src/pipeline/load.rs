use chrono::Utc;

use crate::pipeline::aggregate::dedup_by_id;
use crate::providers::FetchWindow;
use crate::sample::SampleGenerator;
use crate::state::{AppState, DataSource, Session};
use crate::types::filter::DateWindow;

const NO_CREDENTIALS_NOTICE: &str =
    "Using sample data. Set Strava or Intervals.icu credentials to use real data.";

/// Loads a fresh activity history for a session. Provider failures fall back
/// to generated data and carry a notice for the dashboard to show.
pub async fn load_session(state: &AppState, weeks: u32, seed: Option<u64>) -> Session {
    let now = Utc::now();
    let seed = seed.or(state.config().sample_seed);
    let window = DateWindow::last_weeks(weeks, now.date_naive());

    let fetched = {
        let mut provider = state.provider().lock().await;
        match provider.as_mut() {
            Some(client) => {
                let fetch_window = FetchWindow::last_weeks(weeks, now);
                Some((client.name(), client.fetch_activities(&fetch_window).await))
            }
            None => None,
        }
    };

    let notice = match fetched {
        Some((name, Ok(activities))) => {
            return Session {
                activities: dedup_by_id(activities),
                source: DataSource::from_provider(name),
                notice: None,
                weeks,
                window,
                seed,
            };
        }
        Some((name, Err(err))) => {
            tracing::warn!("Falling back to sample data, {} failed: {}", name, err);
            format!("Could not load activities from {}: {}. Showing sample data.", name, err)
        }
        None => NO_CREDENTIALS_NOTICE.to_string(),
    };

    let mut generator = SampleGenerator::new(weeks);
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }

    Session {
        activities: generator.generate(now),
        source: DataSource::Sample,
        notice: Some(notice),
        weeks,
        window,
        seed,
    }
}
