use std::{env, path::PathBuf, time::Duration};

use serde::Serialize;
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 4030;
const DEFAULT_PROXY_BASE: &str = "https://corsproxy.io/?";
const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
const MIN_POLL_INTERVAL_MS: u64 = 10_000;
const MAX_POLL_INTERVAL_MS: u64 = 15_000;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_COVER_LOOKUP_URL: &str = "https://itunes.apple.com/search";
const DEFAULT_USER_AGENT: &str = "now-playing-rs/0.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub port: u16,
    pub allow_insecure_transports: bool,
    pub metadata: MetadataConfig,
    pub cover_lookup: CoverLookupConfig,
    pub profile_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataConfig {
    /// Prefix of the rewriting proxy; the provider URL is appended
    /// percent-encoded. Empty means providers are fetched directly.
    pub proxy_base: String,
    pub poll_interval_ms: u64,
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLookupConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let port = env_u16("PORT", DEFAULT_PORT)?;
        let allow_insecure_transports = env_bool("ALLOW_INSECURE_TRANSPORT").unwrap_or(false);
        let metadata = MetadataConfig::from_env(allow_insecure_transports)?;
        let cover_lookup = CoverLookupConfig::from_env(allow_insecure_transports)?;
        let profile_path = env::var("PROFILE_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            allow_insecure_transports,
            metadata,
            cover_lookup,
            profile_path,
        })
    }
}

impl MetadataConfig {
    fn from_env(allow_insecure_transports: bool) -> Result<Self, ConfigError> {
        let proxy_base = env::var("METADATA_PROXY_BASE")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_PROXY_BASE.to_string());
        let poll_interval_ms = env_u64("METADATA_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        let fetch_timeout_ms =
            env_u64("METADATA_FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)?.clamp(1_000, 30_000);
        let user_agent = env::var("METADATA_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let config = Self {
            proxy_base,
            poll_interval_ms,
            fetch_timeout_ms,
            user_agent,
        };
        config.validate(allow_insecure_transports)?;
        Ok(config)
    }

    fn validate(&self, allow_insecure_transports: bool) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "METADATA_USER_AGENT cannot be blank.".into(),
            ));
        }
        if self.proxy_base.is_empty() {
            return Ok(());
        }
        let url = Url::parse(&self.proxy_base)
            .map_err(|err| ConfigError::Message(format!("Invalid METADATA_PROXY_BASE: {err}")))?;
        ensure_transport(&url, "METADATA_PROXY_BASE", allow_insecure_transports)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CoverLookupConfig {
    fn from_env(allow_insecure_transports: bool) -> Result<Self, ConfigError> {
        let enabled = env_bool("COVER_LOOKUP_ENABLED").unwrap_or(true);
        let base_url = env::var("COVER_LOOKUP_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_COVER_LOOKUP_URL.to_string());
        let url = Url::parse(&base_url)
            .map_err(|err| ConfigError::Message(format!("Invalid COVER_LOOKUP_BASE_URL: {err}")))?;
        ensure_transport(&url, "COVER_LOOKUP_BASE_URL", allow_insecure_transports)?;
        Ok(Self { enabled, base_url })
    }
}

fn ensure_transport(url: &Url, key: &str, allow_insecure_transports: bool) -> Result<(), ConfigError> {
    match url.scheme() {
        "https" => Ok(()),
        "http" if allow_insecure_transports => Ok(()),
        "http" => Err(ConfigError::Message(format!(
            "{key} must use HTTPS unless ALLOW_INSECURE_TRANSPORT=true"
        ))),
        other => Err(ConfigError::Message(format!(
            "{key} has unsupported scheme {other}"
        ))),
    }
}

fn env_u16(key: &str, default: u16) -> Result<u16, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be a valid u16"))),
        Err(_) => Ok(default),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be a valid u64"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str) -> Option<bool> {
    match env::var(key) {
        Ok(value) => match value.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Err(_) => None,
    }
}
