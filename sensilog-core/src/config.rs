//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/sensilog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/sensilog/` (~/.config/sensilog/)
//! - Data: `$XDG_DATA_HOME/sensilog/` (~/.local/share/sensilog/)
//! - State/Logs: `$XDG_STATE_HOME/sensilog/` (~/.local/state/sensilog/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable consulted when `identity.client_id` is not set.
pub const CLIENT_ID_ENV_VAR: &str = "SENSILOG_CLIENT_ID";
/// Environment variable consulted when `identity.client_secret` is not set.
pub const CLIENT_SECRET_ENV_VAR: &str = "SENSILOG_CLIENT_SECRET";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Local profile selection
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// OAuth identity provider configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which local user the CLI acts for
#[derive(Debug, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

fn default_user_id() -> String {
    "local".to_string()
}

/// Analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Number of matches in each of the recent and older trend windows
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_window: default_trend_window(),
        }
    }
}

fn default_trend_window() -> usize {
    10
}

/// OAuth identity provider configuration
///
/// Credentials can also be supplied through `SENSILOG_CLIENT_ID` and
/// `SENSILOG_CLIENT_SECRET`.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// OAuth client ID
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Authorization endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Account info endpoint
    #[serde(default = "default_account_url")]
    pub account_url: String,
    /// HTTP request timeout in seconds
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            account_url: default_account_url(),
            timeout_secs: default_identity_timeout(),
        }
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:3000/auth/callback".to_string()
}

fn default_auth_url() -> String {
    "https://auth.riotgames.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://auth.riotgames.com/token".to_string()
}

fn default_account_url() -> String {
    "https://americas.api.riotgames.com/riot/account/v1/accounts/me".to_string()
}

fn default_identity_timeout() -> u64 {
    30
}

impl IdentityConfig {
    /// Client ID from config, falling back to the environment
    pub fn resolved_client_id(&self) -> Option<String> {
        self.client_id
            .clone()
            .or_else(|| std::env::var(CLIENT_ID_ENV_VAR).ok())
            .filter(|s| !s.is_empty())
    }

    /// Client secret from config, falling back to the environment
    pub fn resolved_client_secret(&self) -> Option<String> {
        self.client_secret
            .clone()
            .or_else(|| std::env::var(CLIENT_SECRET_ENV_VAR).ok())
            .filter(|s| !s.is_empty())
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.resolved_client_id().is_none() {
            return Err(Error::Config(format!(
                "identity.client_id is required (or set {})",
                CLIENT_ID_ENV_VAR
            )));
        }
        if self.resolved_client_secret().is_none() {
            return Err(Error::Config(format!(
                "identity.client_secret is required (or set {})",
                CLIENT_SECRET_ENV_VAR
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "identity.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        if config.analytics.trend_window == 0 {
            return Err(Error::Config(
                "analytics.trend_window must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/sensilog/config.toml` (~/.config/sensilog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("sensilog").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/sensilog/` (~/.local/share/sensilog/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("sensilog")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/sensilog/` (~/.local/state/sensilog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("sensilog")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/sensilog/data.db` (~/.local/share/sensilog/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }
}
