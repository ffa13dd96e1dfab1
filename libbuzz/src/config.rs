//! Configuration management for Buzzalicious
//!
//! Configuration lives in a TOML file at `$BUZZ_CONFIG` or
//! `<config_dir>/buzzalicious/config.toml`. Every section is optional; a
//! missing file yields [`Config::default_config`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.x.com";
pub const DEFAULT_LINKEDIN_API_BASE: &str = "https://api.linkedin.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub linkedin: LinkedInConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/buzzalicious/buzz.db".to_string(),
        }
    }
}

/// Dispatch loop settings. All durations are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub poll_interval: u64,
    pub publish_timeout: u64,
    pub stale_claim_after: u64,
    pub concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: 60,
            publish_timeout: 30,
            stale_claim_after: 900,
            concurrency: 1,
        }
    }
}

impl DispatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub api_base: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TWITTER_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInConfig {
    pub api_base: String,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_LINKEDIN_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Falls back to defaults when the file does not exist. `BUZZ_DB_PATH`
    /// overrides the database path either way.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default_config()
        };

        if let Ok(db_path) = std::env::var("BUZZ_DB_PATH") {
            config.database.path = db_path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig::default(),
            dispatch: DispatchConfig::default(),
            twitter: TwitterConfig::default(),
            linkedin: LinkedInConfig::default(),
        }
    }

    /// Reject values the dispatcher cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()).into());
        }
        if self.dispatch.poll_interval == 0 {
            return Err(invalid("dispatch.poll_interval", "must be at least 1 second"));
        }
        if self.dispatch.publish_timeout == 0 {
            return Err(invalid("dispatch.publish_timeout", "must be at least 1 second"));
        }
        if self.dispatch.stale_claim_after <= self.dispatch.publish_timeout * 2 {
            return Err(invalid(
                "dispatch.stale_claim_after",
                "must be longer than two publish timeouts",
            ));
        }
        if self.dispatch.concurrency == 0 {
            return Err(invalid("dispatch.concurrency", "must be at least 1"));
        }
        for (field, base) in [
            ("twitter.api_base", &self.twitter.api_base),
            ("linkedin.api_base", &self.linkedin.api_base),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(invalid(field, "must start with http:// or https://"));
            }
        }
        Ok(())
    }

    /// Database path with `~` expanded
    pub fn database_path(&self) -> String {
        shellexpand::tilde(&self.database.path).to_string()
    }
}

fn invalid(field: &str, reason: &str) -> crate::error::BuzzError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Resolve the configuration file path using XDG base directories
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("BUZZ_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("buzzalicious").join("config.toml"))
}
