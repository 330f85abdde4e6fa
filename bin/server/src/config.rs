//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.

use casbridge_access::UnknownUserPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Externally visible base URL of this application, used to build CAS
    /// service (callback) URLs.
    pub public_url: String,

    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// CAS login configuration.
    #[serde(default)]
    pub cas: CasConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a logged-in session, in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Lifetime of an anonymous session carrying a pending login, in minutes.
    #[serde(default = "default_anonymous_duration_minutes")]
    pub anonymous_duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_session_duration_minutes() -> i64 {
    480
}

fn default_anonymous_duration_minutes() -> i64 {
    15
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            anonymous_duration_minutes: default_anonymous_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }

    #[must_use]
    pub fn anonymous_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.anonymous_duration_minutes)
    }
}

/// CAS-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CasConfig {
    /// Timeout for one ticket validation request, in seconds.
    #[serde(default = "default_validation_timeout_seconds")]
    pub validation_timeout_seconds: u64,

    /// Policy for principals without a membership record, for tenants that
    /// do not set their own.
    #[serde(default)]
    pub unknown_user_policy: UnknownUserPolicy,
}

fn default_validation_timeout_seconds() -> u64 {
    10
}

impl Default for CasConfig {
    fn default() -> Self {
        Self {
            validation_timeout_seconds: default_validation_timeout_seconds(),
            unknown_user_policy: UnknownUserPolicy::default(),
        }
    }
}

impl CasConfig {
    #[must_use]
    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the public base URL without a trailing slash.
    #[must_use]
    pub fn public_base(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_minutes, 480);
        assert_eq!(config.anonymous_duration_minutes, 15);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
    }

    #[test]
    fn cas_config_has_correct_defaults() {
        let config = CasConfig::default();
        assert_eq!(config.validation_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.unknown_user_policy,
            UnknownUserPolicy::PermissivePending
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "database_url": "postgres://localhost/casbridge",
            "public_url": "https://app.example/",
            "cas": { "unknown_user_policy": "strict" }
        }))
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.public_base(), "https://app.example");
        assert_eq!(config.cas.unknown_user_policy, UnknownUserPolicy::Strict);
        assert_eq!(config.cas.validation_timeout_seconds, 10);
    }
}
