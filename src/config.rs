//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `WAYFARER_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::endpoints::{DEFAULT_API_URL, DEFAULT_WS_URL};
use crate::api::ApiClientConfig;
use crate::chat::DEFAULT_RECONNECT_DELAY;
use crate::map::{Coordinate, DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::session::{Session, SessionUser};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Chat endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_reconnect_delay() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl ChatConfig {
    /// Delay between reconnect attempts; zero falls back to the default
    pub fn reconnect_delay(&self) -> Duration {
        if self.reconnect_delay_ms == 0 {
            tracing::warn!("Ignoring reconnect_delay_ms = 0, using the default delay");
            return DEFAULT_RECONNECT_DELAY;
        }
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Map and place-search widget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub api_key: Option<String>,

    pub geocoder_token: Option<String>,

    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lng")]
    pub center_lng: f64,

    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_center_lat() -> f64 {
    DEFAULT_CENTER.lat
}

fn default_center_lng() -> f64 {
    DEFAULT_CENTER.lng
}

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoder_token: None,
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom: default_zoom(),
        }
    }
}

impl MapConfig {
    /// Configured center, or the default if it is out of range
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center_lat, self.center_lng).unwrap_or(DEFAULT_CENTER)
    }
}

/// Credentials issued by the auth provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub access_token: Option<String>,

    pub user_id: Option<String>,

    pub email: Option<String>,

    pub given_name: Option<String>,

    pub family_name: Option<String>,
}

impl SessionConfig {
    /// Build the session; anonymous when no token is configured
    pub fn to_session(&self) -> Session {
        Session::new(
            self.access_token.clone(),
            SessionUser {
                id: self.user_id.clone(),
                email: self.email.clone(),
                given_name: self.given_name.clone(),
                family_name: self.family_name.clone(),
            },
        )
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Candidate config files, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("wayfarer").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `WAYFARER_*` overrides from any key/value source
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("WAYFARER_API_URL") {
            self.api.base_url = url;
        }
        if let Some(url) = lookup("WAYFARER_WS_URL") {
            self.chat.ws_url = url;
        }
        if let Some(delay) = lookup("WAYFARER_RECONNECT_DELAY_MS") {
            match delay.parse() {
                Ok(ms) if ms > 0 => self.chat.reconnect_delay_ms = ms,
                _ => tracing::warn!(value = %delay, "Ignoring invalid WAYFARER_RECONNECT_DELAY_MS"),
            }
        }
        if let Some(token) = lookup("WAYFARER_ACCESS_TOKEN") {
            self.session.access_token = Some(token);
        }
        if let Some(key) = lookup("WAYFARER_MAP_API_KEY") {
            self.map.api_key = Some(key);
        }
        if let Some(token) = lookup("WAYFARER_GEOCODER_TOKEN") {
            self.map.geocoder_token = Some(token);
        }
        if let Some(level) = lookup("WAYFARER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WAYFARER_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Wayfarer Configuration
#
# Environment variables override these settings:
# - WAYFARER_API_URL
# - WAYFARER_WS_URL
# - WAYFARER_RECONNECT_DELAY_MS
# - WAYFARER_ACCESS_TOKEN
# - WAYFARER_MAP_API_KEY
# - WAYFARER_GEOCODER_TOKEN
# - WAYFARER_LOG_LEVEL
# - WAYFARER_LOG_FORMAT

[api]
# REST backend base URL
base_url = "http://localhost:8080"

# Request timeout in milliseconds
request_timeout_ms = 10000

[chat]
# Chat WebSocket endpoint
ws_url = "ws://localhost:9090/chat/chat"

# Delay before reconnecting a dropped chat connection (ms)
reconnect_delay_ms = 3000

[map]
# Map widget API key
# api_key = ""

# Place search access token
# geocoder_token = ""

# Initial viewport
center_lat = 6.9271
center_lng = 79.8612
zoom = 12

[session]
# Bearer token from the auth provider; leave unset to browse as a guest
# access_token = ""
# email = ""
# given_name = ""
# family_name = ""

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.chat.ws_url, "ws://localhost:9090/chat/chat");
        assert_eq!(config.chat.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.map.center(), DEFAULT_CENTER);
        assert!(!config.session.to_session().is_authenticated());
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.api.base_url, defaults.api.base_url);
        assert_eq!(config.api.request_timeout_ms, defaults.api.request_timeout_ms);
        assert_eq!(config.chat.ws_url, defaults.chat.ws_url);
        assert_eq!(config.chat.reconnect_delay_ms, defaults.chat.reconnect_delay_ms);
        assert_eq!(config.map.zoom, defaults.map.zoom);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[chat]\nreconnect_delay_ms = 500\n\n[session]\naccess_token = \"abc\"\nemail = \"me@example.com\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chat.reconnect_delay(), Duration::from_millis(500));
        assert_eq!(config.chat.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.api.base_url, DEFAULT_API_URL);

        let session = config.session.to_session();
        assert!(session.is_authenticated());
        assert_eq!(session.chat_user().id, "me@example.com");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[chat\nws_url = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("WAYFARER_API_URL", "https://api.example.com"),
            ("WAYFARER_RECONNECT_DELAY_MS", "1500"),
            ("WAYFARER_ACCESS_TOKEN", "tok"),
            ("WAYFARER_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.chat.reconnect_delay_ms, 1500);
        assert_eq!(config.session.access_token.as_deref(), Some("tok"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.chat.ws_url, DEFAULT_WS_URL);
    }

    #[test]
    fn test_invalid_delay_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "WAYFARER_RECONNECT_DELAY_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.chat.reconnect_delay_ms, 3000);
    }

    #[test]
    fn test_zero_delay_is_rejected() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "WAYFARER_RECONNECT_DELAY_MS").then(|| "0".to_string()));
        assert_eq!(config.chat.reconnect_delay_ms, 3000);

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[chat]\nreconnect_delay_ms = 0").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chat.reconnect_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_out_of_range_center_falls_back() {
        let map = MapConfig {
            center_lat: 123.0,
            ..MapConfig::default()
        };
        assert_eq!(map.center(), DEFAULT_CENTER);
    }
}
