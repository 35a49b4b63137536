use std::time::Duration;

pub const MIN_WEEKS: u32 = 4;
pub const MAX_WEEKS: u32 = 52;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WEEKS: u32 = 12;
const DEFAULT_SESSION_TTL_SECONDS: u64 = 3600;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 15;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
const STRAVA_BASE_URL: &str = "https://www.strava.com/api/v3";
const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const INTERVALS_BASE_URL: &str = "https://intervals.icu/api/v1";
const ASSETS_DIR: &str = "assets/web";

#[derive(Debug, Clone)]
pub enum ProviderSettings {
    Strava {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    Intervals {
        athlete_id: String,
        api_key: String,
    },
    None,
}

impl ProviderSettings {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderSettings::Strava { .. } => "strava",
            ProviderSettings::Intervals { .. } => "intervals",
            ProviderSettings::None => "sample",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub provider: ProviderSettings,
    pub strava_base_url: String,
    pub strava_token_url: String,
    pub intervals_base_url: String,
    pub http_timeout: Duration,
    pub retry: RetrySettings,
    pub session_ttl: Duration,
    pub default_weeks: u32,
    pub sample_seed: Option<u64>,
    pub assets_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
        let session_ttl_seconds = env_parse("SESSION_TTL_SECONDS").unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        let http_timeout_seconds = env_parse("HTTP_TIMEOUT_SECONDS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);
        let default_weeks = clamp_weeks(env_parse("DEFAULT_WEEKS").unwrap_or(DEFAULT_WEEKS));

        Self {
            port,
            provider: provider_from_env(),
            strava_base_url: env_string("STRAVA_BASE_URL")
                .unwrap_or_else(|| STRAVA_BASE_URL.to_string()),
            strava_token_url: env_string("STRAVA_TOKEN_URL")
                .unwrap_or_else(|| STRAVA_TOKEN_URL.to_string()),
            intervals_base_url: env_string("INTERVALS_BASE_URL")
                .unwrap_or_else(|| INTERVALS_BASE_URL.to_string()),
            http_timeout: Duration::from_secs(http_timeout_seconds),
            retry: RetrySettings {
                attempts: env_parse("RETRY_ATTEMPTS").unwrap_or(DEFAULT_RETRY_ATTEMPTS),
                base_delay: Duration::from_millis(
                    env_parse("RETRY_BASE_DELAY_MS").unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
                ),
            },
            session_ttl: Duration::from_secs(session_ttl_seconds),
            default_weeks,
            sample_seed: env_parse("SAMPLE_SEED"),
            assets_dir: env_string("ASSETS_DIR").unwrap_or_else(|| ASSETS_DIR.to_string()),
        }
    }

    /// Built-in defaults with no provider credentials, always serving seeded
    /// sample data. Ignores the environment.
    pub fn offline() -> Self {
        Self {
            port: DEFAULT_PORT,
            provider: ProviderSettings::None,
            strava_base_url: STRAVA_BASE_URL.to_string(),
            strava_token_url: STRAVA_TOKEN_URL.to_string(),
            intervals_base_url: INTERVALS_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            retry: RetrySettings {
                attempts: DEFAULT_RETRY_ATTEMPTS,
                base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            },
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            default_weeks: DEFAULT_WEEKS,
            sample_seed: Some(42),
            assets_dir: ASSETS_DIR.to_string(),
        }
    }
}

pub fn clamp_weeks(weeks: u32) -> u32 {
    weeks.clamp(MIN_WEEKS, MAX_WEEKS)
}

/// `DATA_PROVIDER` picks a provider explicitly; otherwise the first complete
/// credential set wins, Intervals.icu before Strava.
fn provider_from_env() -> ProviderSettings {
    let requested = env_string("DATA_PROVIDER").map(|s| s.to_lowercase());

    let intervals = match (env_string("INTERVALS_ATHLETE_ID"), env_string("INTERVALS_API_KEY")) {
        (Some(athlete_id), Some(api_key)) => Some(ProviderSettings::Intervals { athlete_id, api_key }),
        _ => None,
    };
    let strava = match (
        env_string("STRAVA_CLIENT_ID"),
        env_string("STRAVA_CLIENT_SECRET"),
        env_string("STRAVA_REFRESH_TOKEN"),
    ) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(ProviderSettings::Strava {
            client_id,
            client_secret,
            refresh_token,
        }),
        _ => None,
    };

    let selected = match requested.as_deref() {
        Some("strava") => strava,
        Some("intervals") => intervals,
        Some("sample") => None,
        _ => intervals.or(strava),
    };

    selected.unwrap_or(ProviderSettings::None)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse().ok())
}
