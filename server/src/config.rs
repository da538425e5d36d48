//! Configuration management

use serde::{Deserialize, Serialize};
use mobileorder_core::{Error, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite:data/mobileorder.db";
const DEFAULT_CLEANUP_SCHEDULE: &str = "0 0 * * * *";

/// Longest accepted token lifetime (five years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 5;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// HMAC secret used to sign access tokens
    #[serde(default)]
    pub secret: String,

    /// Port used when no explicit bind address is given
    #[serde(default = "default_port")]
    pub port: u16,

    /// Access token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Cron expression for the login rate limiter cleanup
    #[serde(default = "default_cleanup_schedule")]
    pub cleanup_schedule: String,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl_hours() -> i64 {
    72
}

fn default_cleanup_schedule() -> String {
    DEFAULT_CLEANUP_SCHEDULE.to_string()
}

fn default_static_dir() -> String {
    "server/static".to_string()
}

impl Config {
    /// Configuration with default values and the given signing secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            database_url: default_database_url(),
            secret: secret.into(),
            port: default_port(),
            token_ttl_hours: default_token_ttl_hours(),
            cleanup_schedule: default_cleanup_schedule(),
            static_dir: default_static_dir(),
        }
    }

    /// Load configuration from file or environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = if let Some(p) = path {
            Self::load_from_file(p)?
        } else {
            Self::load_from_env()?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from configuration file
    ///
    /// A secret missing from the file is taken from the environment.
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;

        if config.secret.is_empty() {
            config.secret = get_secret("SECRET").unwrap_or_default();
        }

        Ok(config)
    }

    /// Load from environment variables
    fn load_from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = secret_from(&lookup, "SECRET").unwrap_or_default();
        let mut config = Self::new(secret);

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|e| Error::ConfigError(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(hours) = lookup("TOKEN_TTL_HOURS") {
            config.token_ttl_hours = hours.parse().map_err(|e| {
                Error::ConfigError(format!("Invalid TOKEN_TTL_HOURS '{}': {}", hours, e))
            })?;
        }
        if let Some(schedule) = lookup("CLEANUP_SCHEDULE") {
            config.cleanup_schedule = schedule;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = dir;
        }

        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.secret.trim().is_empty() {
            return Err(Error::ConfigError(
                "SECRET (or SECRET_FILE) must be set".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(Error::ConfigError(format!(
                "token_ttl_hours must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, self.token_ttl_hours
            )));
        }
        Ok(())
    }
}

/// Get secret from environment variable or file
///
/// Supports both direct environment variables and file-based secrets (Docker/Kubernetes pattern).
/// If `VAR_NAME` is not found, tries `VAR_NAME_FILE` which should point to a file containing the secret.
pub fn get_secret(var_name: &str) -> Option<String> {
    secret_from(&|name: &str| std::env::var(name).ok(), var_name)
}

fn secret_from(lookup: &impl Fn(&str) -> Option<String>, var_name: &str) -> Option<String> {
    // Try environment variable first
    if let Some(value) = lookup(var_name) {
        return Some(value);
    }

    // Try file-based secret (Docker secrets / Kubernetes)
    let file_var = format!("{}_FILE", var_name);
    if let Some(path) = lookup(&file_var) {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            return Some(contents.trim().to_string());
        }
    }

    None
}
