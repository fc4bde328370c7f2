//! Configuration management for vartiss-mailer
//!
//! Config file location:
//! - Linux: ~/.config/vartiss-mailer/config.toml
//! - macOS: ~/Library/Application Support/vartiss-mailer/config.toml
//! - Windows: %APPDATA%/vartiss-mailer/config.toml
//!
//! You can override the config location by setting `VARTISS_MAILER_CONFIG_PATH`,
//! and the primary endpoint with `VARTISS_MAIL_URL`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mailer::{Endpoints, DEFAULT_FALLBACK_URLS, DEFAULT_PRIMARY_URL};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Mail endpoint cascade configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Optional third-party form relay
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("VARTISS_MAILER_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "vartiss", "vartiss-mailer")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }

    /// Resolve the ordered endpoint candidates and their timeout budgets,
    /// honoring the `VARTISS_MAIL_URL` override for the primary.
    pub fn endpoints(&self) -> Endpoints {
        let primary = std::env::var("VARTISS_MAIL_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.mail.primary_url.clone());

        Endpoints {
            primary,
            fallbacks: self.mail.fallback_urls.clone(),
            primary_timeout: Duration::from_secs(self.mail.primary_timeout_seconds.max(1)),
            retry_timeout: Duration::from_secs(self.mail.retry_timeout_seconds.max(1)),
            fallback_timeout: Duration::from_secs(self.mail.fallback_timeout_seconds.max(1)),
            retry_backoff: Duration::from_millis(self.mail.retry_backoff_ms),
        }
    }
}

/// Mail cascade configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Primary backend URL
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Fallback URLs, tried in order when the primary never responds
    #[serde(default = "default_fallback_urls")]
    pub fallback_urls: Vec<String>,

    /// Budget for the first primary attempt, in seconds
    #[serde(default = "default_primary_timeout")]
    pub primary_timeout_seconds: u64,

    /// Extended budget for the single primary retry, in seconds
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout_seconds: u64,

    /// Budget per fallback attempt, in seconds
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_seconds: u64,

    /// Pause before the server-error retry, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            fallback_urls: default_fallback_urls(),
            primary_timeout_seconds: default_primary_timeout(),
            retry_timeout_seconds: default_retry_timeout(),
            fallback_timeout_seconds: default_fallback_timeout(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_primary_url() -> String {
    DEFAULT_PRIMARY_URL.to_string()
}

fn default_fallback_urls() -> Vec<String> {
    DEFAULT_FALLBACK_URLS.iter().map(|s| s.to_string()).collect()
}

fn default_primary_timeout() -> u64 {
    15
}

fn default_retry_timeout() -> u64 {
    30
}

fn default_fallback_timeout() -> u64 {
    15
}

fn default_retry_backoff_ms() -> u64 {
    1200
}

/// Third-party relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// When set, submissions POST once to this endpoint instead of entering
    /// the mail cascade.
    #[serde(default)]
    pub endpoint: Option<String>,
}
