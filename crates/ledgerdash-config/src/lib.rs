//! Configuration management for ledgerdash
//!
//! This module handles loading, validation, and management of
//! ledgerdash configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub use error::{ConfigError, ConfigErrorCode, ConfigErrorDetails, ConfigErrorSeverity, ConfigResult};

/// Owner of the rows created by the demo seed, also the default dashboard user.
pub const DEMO_USER_ID: &str = "08ad4845-2f67-49cc-81ec-6986cec04446";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accounts allowed to sign in with HTTP basic auth
    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            users: default_users(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_users() -> Vec<UserConfig> {
    vec![UserConfig {
        username: "demo".to_string(),
        password: "demo".to_string(),
        user_id: DEMO_USER_ID.to_string(),
    }]
}

/// A dashboard login and the store identity it maps to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub user_id: String,
}

/// In-memory store seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of rows to generate; a random count in 60..120 when unset
    #[serde(default)]
    pub seed_count: Option<usize>,
    /// Owner of the generated rows
    #[serde(default = "default_seed_user")]
    pub seed_user_id: String,
    /// Fixed RNG seed for reproducible data
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_count: None,
            seed_user_id: default_seed_user(),
            rng_seed: None,
        }
    }
}

fn default_seed_user() -> String {
    DEMO_USER_ID.to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Rows per dashboard page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO code used when rendering amounts
    #[serde(default = "default_currency")]
    pub code: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "Port must be greater than 0"));
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::invalid(
                "pagination.page_size",
                "Page size must be at least 1",
            ));
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::invalid(
                "currency.decimal_places",
                "Decimal places must be between 0 and 10",
            ));
        }

        if self.store.seed_user_id.trim().is_empty() {
            return Err(ConfigError::invalid("store.seed_user_id", "Seed user id must not be empty"));
        }

        let mut seen = HashSet::new();
        for user in &self.server.users {
            if user.user_id.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "server.users.user_id",
                    "Every user needs a non-empty user_id",
                ));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::DuplicateUser {
                    username: user.username.clone(),
                });
            }
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Look up a dashboard user by login name
    pub fn user(&self, username: &str) -> Option<&UserConfig> {
        self.server.users.iter().find(|u| u.username == username)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
