//! Configuration management
//!
//! This module handles loading and parsing configuration for postline.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. The data service
//! connection (URL and access key) has no default: `Config::validate` rejects a
//! configuration without it, and startup aborts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::display::{DisplayClock, DEFAULT_UTC_OFFSET_MINUTES};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hosted data service connection
    #[serde(default)]
    pub service: ServiceConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Display formatting
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Hosted data service connection
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,
    /// Public (anon) access key
    #[serde(default)]
    pub key: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

// The access key stays out of logs
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("url", &self.url)
            .field("key", &if self.key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_timeout() -> u64 {
    10
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the front end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Display formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Offset from UTC, in minutes, that display dates are rendered in
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

fn default_utc_offset() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

impl DisplayConfig {
    /// Clock rendering dates in the configured offset
    pub fn clock(&self) -> DisplayClock {
        DisplayClock::with_offset_minutes(self.utc_offset_minutes)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - POSTLINE_SERVICE_URL (or SUPABASE_URL)
    /// - POSTLINE_SERVICE_KEY (or SUPABASE_ANON_KEY)
    /// - POSTLINE_SERVICE_TIMEOUT_SECONDS
    /// - POSTLINE_SERVER_HOST
    /// - POSTLINE_SERVER_PORT
    /// - POSTLINE_SERVER_CORS_ORIGIN
    /// - POSTLINE_DISPLAY_UTC_OFFSET_MINUTES
    ///
    /// The POSTLINE_ names win over the SUPABASE_ aliases when both are set.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Service configuration
        if let Some(url) = env_first(&["POSTLINE_SERVICE_URL", "SUPABASE_URL"]) {
            self.service.url = url;
        }
        if let Some(key) = env_first(&["POSTLINE_SERVICE_KEY", "SUPABASE_ANON_KEY"]) {
            self.service.key = key;
        }
        if let Ok(timeout) = std::env::var("POSTLINE_SERVICE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.service.timeout_seconds = timeout;
            }
        }

        // Server configuration
        if let Ok(host) = std::env::var("POSTLINE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("POSTLINE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("POSTLINE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Display configuration
        if let Ok(offset) = std::env::var("POSTLINE_DISPLAY_UTC_OFFSET_MINUTES") {
            if let Ok(offset) = offset.parse::<i32>() {
                self.display.utc_offset_minutes = offset;
            }
        }
    }

    /// Check that the configuration can reach the data service.
    ///
    /// Fails when the service URL or key is missing, or the URL is not http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.service.url.trim();
        if url.is_empty() || self.service.key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data service is not configured: set service.url and service.key \
                 (or POSTLINE_SERVICE_URL and POSTLINE_SERVICE_KEY)"
                    .to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "service.url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.service.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "service.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "POSTLINE_SERVICE_URL",
        "POSTLINE_SERVICE_KEY",
        "POSTLINE_SERVICE_TIMEOUT_SECONDS",
        "POSTLINE_SERVER_HOST",
        "POSTLINE_SERVER_PORT",
        "POSTLINE_SERVER_CORS_ORIGIN",
        "POSTLINE_DISPLAY_UTC_OFFSET_MINUTES",
        "SUPABASE_URL",
        "SUPABASE_ANON_KEY",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.service.url = "https://demo.example.co".to_string();
        config.service.key = "anon-key".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service.timeout_seconds, 10);
        assert_eq!(config.display.utc_offset_minutes, 480);
        assert!(config.service.url.is_empty());
    }

    #[test]
    fn test_load_nonexistent_file_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/postline.yml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let file = write_config("   \n\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            "service:\n  url: \"https://abc.supabase.co\"\n  key: \"k\"\n  timeout_seconds: 3\n\
             server:\n  host: \"127.0.0.1\"\n  port: 9000\n  cors_origin: \"http://blog.test\"\n\
             display:\n  utc_offset_minutes: -300\n",
        );
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.service.url, "https://abc.supabase.co");
        assert_eq!(config.service.key, "k");
        assert_eq!(config.service.timeout_seconds, 3);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "http://blog.test");
        assert_eq!(config.display.utc_offset_minutes, -300);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let file = write_config("server:\n  port: 9100\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.service.timeout_seconds, 10);
    }

    #[test]
    fn test_load_invalid_yaml_reports_location() {
        let file = write_config("server:\n  port: not_a_number\n");
        let err = Config::load(file.path()).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("Failed to parse config file"), "{}", message);
        assert!(message.contains("line"), "{}", message);
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();
        clear_env();
        std::env::set_var("POSTLINE_SERVICE_URL", "https://env.example.co");
        std::env::set_var("POSTLINE_SERVICE_KEY", "env-key");
        std::env::set_var("POSTLINE_SERVER_PORT", "7000");
        std::env::set_var("POSTLINE_DISPLAY_UTC_OFFSET_MINUTES", "60");

        let config = Config::load_with_env(Path::new("/nonexistent/postline.yml")).unwrap();
        clear_env();

        assert_eq!(config.service.url, "https://env.example.co");
        assert_eq!(config.service.key, "env-key");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.display.utc_offset_minutes, 60);
    }

    #[test]
    fn test_supabase_aliases() {
        let _guard = lock_env();
        clear_env();
        std::env::set_var("SUPABASE_URL", "https://alias.supabase.co");
        std::env::set_var("SUPABASE_ANON_KEY", "alias-key");

        let config = Config::load_with_env(Path::new("/nonexistent/postline.yml")).unwrap();
        clear_env();

        assert_eq!(config.service.url, "https://alias.supabase.co");
        assert_eq!(config.service.key, "alias-key");
    }

    #[test]
    fn test_prefixed_names_win_over_aliases() {
        let _guard = lock_env();
        clear_env();
        std::env::set_var("SUPABASE_URL", "https://alias.supabase.co");
        std::env::set_var("POSTLINE_SERVICE_URL", "https://primary.example.co");

        let config = Config::load_with_env(Path::new("/nonexistent/postline.yml")).unwrap();
        clear_env();

        assert_eq!(config.service.url, "https://primary.example.co");
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let _guard = lock_env();
        clear_env();
        std::env::set_var("POSTLINE_SERVER_PORT", "not-a-port");
        std::env::set_var("POSTLINE_SERVICE_TIMEOUT_SECONDS", "-1");

        let config = Config::load_with_env(Path::new("/nonexistent/postline.yml")).unwrap();
        clear_env();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service.timeout_seconds, 10);
    }

    #[test]
    fn test_validate_accepts_configured_service() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_service() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let mut config = configured();
        config.service.key = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = configured();
        config.service.url = "ftp://files.example.co".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = configured();
        config.service.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", configured().service);
        assert!(!rendered.contains("anon-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
