// Service configuration, read from the environment
// A `.env` file in the working directory is honoured when present

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "https://ce.judge0.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_LANGUAGES_CONFIG: &str = "config/languages.json";
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_BACKEND_HTTP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 45_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub backend_auth_token: Option<String>,
    pub bind_addr: String,
    /// Usage tracking is disabled when unset
    pub redis_url: Option<String>,
    pub languages_config: PathBuf,
    pub poll_max_attempts: u32,
    pub poll_interval: Duration,
    pub backend_http_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_auth_token: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            redis_url: None,
            languages_config: PathBuf::from(DEFAULT_LANGUAGES_CONFIG),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            backend_http_timeout: Duration::from_millis(DEFAULT_BACKEND_HTTP_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let poll_max_attempts = match get("POLL_MAX_ATTEMPTS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("POLL_MAX_ATTEMPTS must be a positive integer, got '{}'", v))?,
            None => defaults.poll_max_attempts,
        };
        if poll_max_attempts == 0 {
            bail!("POLL_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            backend_url: get("JUDGE0_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            backend_auth_token: get("JUDGE0_AUTH_TOKEN"),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            redis_url: get("REDIS_URL"),
            languages_config: get("LANGUAGES_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.languages_config),
            poll_max_attempts,
            poll_interval: millis(&get, "POLL_INTERVAL_MS", defaults.poll_interval)?,
            backend_http_timeout: millis(&get, "BACKEND_HTTP_TIMEOUT_MS", defaults.backend_http_timeout)?,
            request_timeout: millis(&get, "REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
        })
    }
}

fn millis<F>(get: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => {
            let ms = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of milliseconds, got '{}'", key, v))?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(default),
    }
}
