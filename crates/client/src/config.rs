use std::path::PathBuf;
use std::time::Duration;

/// Default backend base URL for local development.
const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Default location of the durable key/value file.
const DEFAULT_STORAGE_PATH: &str = ".ideabox/storage.json";

/// Default transport timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL; `/auth` and `/ideabox` are resolved against it.
    pub backend_url: String,
    /// File backing the durable token and display-name entries.
    pub storage_path: PathBuf,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
}

/// A configuration value could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `IDEABOX_BACKEND_URL`          | `http://localhost:3000` |
    /// | `IDEABOX_STORAGE_PATH`         | `.ideabox/storage.json` |
    /// | `IDEABOX_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = lookup("IDEABOX_BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.backend_url);

        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "IDEABOX_BACKEND_URL",
                expected: "an http(s) URL",
                value: backend_url,
            });
        }

        let storage_path = lookup("IDEABOX_STORAGE_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let request_timeout = match lookup("IDEABOX_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "IDEABOX_REQUEST_TIMEOUT_SECS",
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            backend_url,
            storage_path,
            request_timeout,
        })
    }
}
