use std::path::PathBuf;
use std::time::Duration;

use crate::batch::DEFAULT_YEAR;
use crate::error::ConfigError;

pub const ENV_BACKEND_URL: &str = "HARBORVIEW_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "HARBORVIEW_TIMEOUT_SECS";
pub const ENV_YEAR: &str = "HARBORVIEW_YEAR";
pub const ENV_STATE_DIR: &str = "HARBORVIEW_STATE_DIR";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STATE_DIR: &str = "./harborview-state";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    /// Applied to every backend request; expiry is a fetch failure.
    pub timeout: Duration,
    /// Year the month batches fall in.
    pub year: i32,
    /// Where pinned dashboards are stored.
    pub state_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            year: DEFAULT_YEAR,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or blank keys keep their defaults.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_BACKEND_URL) {
            config.backend_url = url.trim().to_owned();
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    key: ENV_TIMEOUT_SECS,
                    value,
                    expected: "a positive number of seconds",
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get(ENV_YEAR) {
            config.year = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_YEAR,
                value,
                expected: "a calendar year",
            })?;
        }
        if let Some(dir) = get(ENV_STATE_DIR) {
            config.state_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }
}
