//! Configuration types for url-multiplexer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "MULTIPLEXER_CONFIG";

/// Main configuration for url-multiplexer
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Listener and lifecycle settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Batch and upstream fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Listener and lifecycle configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Budget for draining in-flight requests on shutdown (default: 10s)
    #[serde(
        default = "default_shutdown_timeout",
        rename = "shutdown_timeout_ms",
        with = "duration_ms_serde"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Batch bounds and upstream fetch timing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FetchConfig {
    /// Maximum number of URLs in one batch (default: 20)
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,

    /// Single deadline shared by every fetch of one batch (default: 10s)
    #[serde(
        default = "default_request_deadline",
        rename = "request_deadline_ms",
        with = "duration_ms_serde"
    )]
    pub request_deadline: Duration,

    /// Upper bound on establishing one upstream connection (default: 1s)
    #[serde(
        default = "default_connect_timeout",
        rename = "connect_timeout_ms",
        with = "duration_ms_serde"
    )]
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_urls: default_max_urls(),
            request_deadline: default_request_deadline(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Config {
    /// Load configuration for the service binary.
    ///
    /// Starts from `path` (or built-in defaults when `None`), applies
    /// `MULTIPLEXER_*` environment overrides, then validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from `MULTIPLEXER_*` environment variables.
    ///
    /// A variable that is set but cannot be parsed is an error rather than
    /// being silently ignored.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(addr) = env_var("MULTIPLEXER_BIND_ADDRESS", "server.bind_address")? {
            self.server.bind_address = addr;
        }
        if let Some(ms) = env_var("MULTIPLEXER_SHUTDOWN_TIMEOUT_MS", "server.shutdown_timeout_ms")? {
            self.server.shutdown_timeout = Duration::from_millis(ms);
        }
        if let Some(max) = env_var("MULTIPLEXER_MAX_URLS", "fetch.max_urls")? {
            self.fetch.max_urls = max;
        }
        if let Some(ms) = env_var("MULTIPLEXER_REQUEST_DEADLINE_MS", "fetch.request_deadline_ms")? {
            self.fetch.request_deadline = Duration::from_millis(ms);
        }
        if let Some(ms) = env_var("MULTIPLEXER_CONNECT_TIMEOUT_MS", "fetch.connect_timeout_ms")? {
            self.fetch.connect_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_urls == 0 {
            return Err(Error::config(
                "fetch.max_urls",
                "must be greater than zero",
            ));
        }
        if self.fetch.request_deadline.is_zero() {
            return Err(Error::config(
                "fetch.request_deadline_ms",
                "must be greater than zero",
            ));
        }
        if self.fetch.connect_timeout.is_zero() {
            return Err(Error::config(
                "fetch.connect_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.fetch.connect_timeout > self.fetch.request_deadline {
            return Err(Error::config(
                "fetch.connect_timeout_ms",
                format!(
                    "connect timeout ({:?}) exceeds request deadline ({:?})",
                    self.fetch.connect_timeout, self.fetch.request_deadline
                ),
            ));
        }
        if self.server.shutdown_timeout.is_zero() {
            return Err(Error::config(
                "server.shutdown_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn env_var<T>(name: &str, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::config(key, format!("invalid value {raw:?} in {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_urls() -> usize {
    20
}

fn default_request_deadline() -> Duration {
    Duration::from_secs(10)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(1)
}

// Duration <-> integer milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
