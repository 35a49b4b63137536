use crate::config::Config;
use crate::providers::ProviderClient;
use crate::types::activity::Activity;
use crate::types::filter::DateWindow;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Strava,
    Intervals,
    Sample,
}

impl DataSource {
    pub fn from_provider(name: &str) -> Self {
        match name {
            "strava" => DataSource::Strava,
            "intervals" => DataSource::Intervals,
            _ => DataSource::Sample,
        }
    }
}

/// One dashboard session's private copy of the activity history.
#[derive(Debug, Clone)]
pub struct Session {
    pub activities: Vec<Activity>,
    pub source: DataSource,
    pub notice: Option<String>,
    pub weeks: u32,
    /// Local dates covered by the load, used when a filter leaves either end open.
    pub window: DateWindow,
    pub seed: Option<u64>,
}

struct CachedSession {
    session: Session,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    provider: Arc<Mutex<Option<ProviderClient>>>,
    sessions: Arc<DashMap<String, CachedSession>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let provider = match ProviderClient::from_config(&config) {
            Ok(provider) => provider,
            Err(err) => {
                tracing::error!("Provider disabled: {}", err);
                None
            }
        };
        match &provider {
            Some(client) => tracing::info!("Activity provider: {}", client.name()),
            None => tracing::info!("No activity provider configured, serving sample data"),
        }

        Self {
            config: Arc::new(config),
            provider: Arc::new(Mutex::new(provider)),
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn provider(&self) -> &Mutex<Option<ProviderClient>> {
        &self.provider
    }

    pub fn insert(&self, session_id: String, session: Session) {
        self.sessions.insert(
            session_id,
            CachedSession {
                session,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|entry| entry.session.clone())
    }

    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.sessions.retain(|_, cached| {
            now.duration_since(cached.inserted_at) < ttl
        });
        tracing::info!("Session eviction complete. Current size: {}", self.sessions.len());
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
