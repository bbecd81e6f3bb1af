//! Application configuration loaded from environment variables.
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Helmet Options
//!
//! - `HELMET_CONFIG`: Path to a JSON options file. When unset, the demo server
//!   uses a small built-in policy (see [`Config::helmet_options`]).
//!
//! # Observability
//!
//! - `RUST_LOG`: Log filter (default: `info`), read by the tracing
//!   subscriber before this config is loaded
//! - `METRICS_PORT`: Prometheus listener port (default: 0 = disabled)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde_json::json;

use crate::error::{ConfigError, ConfigResult};
use crate::helmet::HelmetOptions;

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// let helmet = Helmet::new(&config.helmet_options()?)?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8080)
    pub port: u16,

    // =========================================================================
    // Helmet Configuration
    // =========================================================================
    /// JSON file holding the helmet options bag (optional)
    pub helmet_config: Option<PathBuf>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Prometheus metrics port (default: 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Env` if a variable cannot be parsed or the
    /// resulting configuration is inconsistent.
    pub fn from_env() -> ConfigResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8080)?,

            // Helmet
            helmet_config: env::var("HELMET_CONFIG")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            // Observability
            metrics_port: Self::parse_env("METRICS_PORT", 0)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Env` if validation fails.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Env("HOST cannot be empty".to_string()));
        }

        if self.metrics_enabled() && self.metrics_port == self.port {
            return Err(ConfigError::Env(format!(
                "METRICS_PORT ({}) must differ from PORT ({})",
                self.metrics_port, self.port
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_enabled()
            .then(|| SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Load the helmet options bag.
    ///
    /// Reads `HELMET_CONFIG` when set, otherwise returns the demo policy:
    /// a two-directive CSP, `Referrer-Policy: no-referrer` and
    /// `Server: hp-helmet`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it is not a valid options bag.
    pub fn helmet_options(&self) -> ConfigResult<HelmetOptions> {
        match &self.helmet_config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                HelmetOptions::from_json_str(&json)
            }
            None => Self::demo_helmet_options(),
        }
    }

    fn demo_helmet_options() -> ConfigResult<HelmetOptions> {
        HelmetOptions::from_json_value(json!({
            "contentSecurityPolicy": {
                "directives": {
                    "default-src": ["'self'"],
                    "script-src": ["'self'", "https://cdn.example.com"]
                }
            },
            "referrerPolicy": { "policy": "no-referrer" },
            "xPoweredBy": { "serverValue": "hp-helmet" }
        }))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| ConfigError::Env(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            helmet_config: None,
            metrics_port: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::helmet::{Helmet, RuleSetting};
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.helmet_config.is_none());
        assert!(!config.metrics_enabled());
        assert!(config.metrics_addr().is_none());
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_metrics_addr() {
        let config = Config {
            metrics_port: 9090,
            ..Config::default()
        };

        assert_eq!(
            config.metrics_addr(),
            Some(SocketAddr::from(([0, 0, 0, 0], 9090)))
        );
    }

    #[test]
    fn test_validate_empty_host() {
        let config = Config {
            host: "  ".to_string(),
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HOST"));
    }

    #[test]
    fn test_validate_port_clash() {
        let config = Config {
            port: 9090,
            metrics_port: 9090,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_demo_options_resolve() {
        let options = Config::default().helmet_options().unwrap();

        assert!(matches!(
            options.content_security_policy,
            Some(RuleSetting::Configured(_))
        ));
        assert!(Helmet::new(&options).is_ok());
    }

    #[test]
    fn test_helmet_options_from_file() {
        let path = std::env::temp_dir().join(format!("helmet-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{ "hsts": { "maxAge": 60 } }"#).unwrap();
        drop(file);

        let config = Config {
            helmet_config: Some(path.clone()),
            ..Config::default()
        };
        let options = config.helmet_options().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(options.hsts.is_some());
    }

    #[test]
    fn test_helmet_options_missing_file() {
        let config = Config {
            helmet_config: Some(PathBuf::from("/nonexistent/helmet.json")),
            ..Config::default()
        };

        assert!(matches!(
            config.helmet_options(),
            Err(ConfigError::Io { .. })
        ));
    }
}
