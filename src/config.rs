//! Environment configuration with validation

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Game economy configuration
    pub game: GameConfig,

    /// Authentication configuration
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the single JSON document the whole game state lives in
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Coins granted to every freshly created user
    pub starting_coins: u64,
    pub max_league_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When set, settlement endpoints require this token in `x-admin-token`
    pub admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort)?,
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },

            storage: StorageConfig {
                data_file: env::var("DATA_FILE")
                    .unwrap_or_else(|_| "multiuser_data.json".to_string())
                    .into(),
            },

            game: GameConfig {
                starting_coins: env::var("STARTING_COINS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
                max_league_members: env::var("MAX_LEAGUE_MEMBERS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },

            auth: AuthConfig {
                admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.storage.data_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("DATA_FILE".to_string()));
        }

        if self.game.starting_coins == 0 {
            return Err(ConfigError::InvalidConfig(
                "starting_coins must be greater than 0".to_string(),
            ));
        }

        if self.game.max_league_members < 2 {
            return Err(ConfigError::InvalidConfig(
                "max_league_members must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
