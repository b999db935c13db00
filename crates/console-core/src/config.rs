//! Configuration management for the console client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default game backend origin.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default realtime socket path on the backend.
pub const DEFAULT_REALTIME_PATH: &str = "/realtime/ws";

/// Default interval between fallback polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend origin; relative endpoints resolve against it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Realtime socket path or absolute ws:// URL.
    #[serde(default = "default_realtime_path")]
    pub realtime_path: String,
    /// Endpoint polled when the socket is unavailable. No fallback when unset.
    #[serde(default)]
    pub poll_path: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// The local player's user id.
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    /// Bearer token attached to API calls and the realtime URL.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_realtime_path() -> String {
    DEFAULT_REALTIME_PATH.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_user_id() -> i64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            realtime_path: default_realtime_path(),
            poll_path: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            user_id: default_user_id(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from `SIM_CONSOLE_*` variables provided by `lookup`.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).and_then(non_empty);

        if let Some(level) = lookup("SIM_CONSOLE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = lookup("SIM_CONSOLE_API_URL") {
            self.api_base_url = url;
        }
        if let Some(path) = lookup("SIM_CONSOLE_POLL_PATH") {
            self.poll_path = Some(path);
        }
        if let Some(token) = lookup("SIM_CONSOLE_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }
        if let Some(raw) = lookup("SIM_CONSOLE_USER_ID") {
            match raw.parse::<i64>() {
                Ok(id) => self.user_id = id,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric SIM_CONSOLE_USER_ID"),
            }
        }
    }

    /// Reject values that cannot drive a session.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The backend origin as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// Realtime endpoint with the auth token appended as a query parameter.
    pub fn realtime_endpoint(&self) -> String {
        match self.auth_token.as_deref() {
            Some(token) => {
                let separator = if self.realtime_path.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}token={}",
                    self.realtime_path,
                    separator,
                    urlencoding::encode(token)
                )
            }
            None => self.realtime_path.clone(),
        }
    }

    /// Absolute poll URL, if polling fallback is configured.
    pub fn poll_url(&self) -> CoreResult<Option<Url>> {
        match self.poll_path.as_deref() {
            Some(path) => Ok(Some(self.api_base_url()?.join(path)?)),
            None => Ok(None),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
