//! Client configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory.

use crate::retry::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SESSION_PATH: &str = ".okr_session";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend address without trailing slash, e.g. `http://localhost:8000`
    pub base_url: String,
    pub timeout: Duration,
    /// Policy used by the endpoints that retry (login, departments, users)
    pub retry: RetryPolicy,
    /// Location of the sled database holding the auth token
    pub session_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Load `.env` (if any) then read `API_BASE_URL`, `API_TIMEOUT_SECS`, `OKR_SESSION_PATH`
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(url) = env_string("API_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(secs) = env_string("API_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = env_string("OKR_SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_conventions() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let config = ClientConfig::new("https://okr.example.com//");
        assert_eq!(config.base_url, "https://okr.example.com");
    }

    #[test]
    fn builders_override_fields() {
        let config = ClientConfig::new("http://127.0.0.1:9000")
            .with_timeout(Duration::from_millis(250))
            .with_retry_policy(RetryPolicy::none())
            .with_session_path("/tmp/okr-session");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.session_path, PathBuf::from("/tmp/okr-session"));
    }
}
