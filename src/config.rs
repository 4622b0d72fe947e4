//! NotifyMeOn configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main NotifyMeOn configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// HTTP command surface
    #[serde(default)]
    pub server: ServerConfig,

    /// Discord platform access
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Config backend storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification behaviour
    #[serde(default)]
    pub notify: NotifyOptions,
}

impl NotifyConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.notify.history_capacity == 0 {
            return Err(Error::Config(
                "notify.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.discord.api_base.trim().is_empty() {
            return Err(Error::Config("discord.api_base must not be empty".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
        }
    }
}

/// Discord configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Environment variable holding the bot token
    pub bot_token_ref: String,

    /// REST API base URL
    pub api_base: String,

    /// Allowed guild IDs (empty = all allowed)
    #[serde(default)]
    pub allowed_guilds: Vec<u64>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token_ref: "DISCORD_BOT_TOKEN".to_string(),
            api_base: "https://discord.com/api/v10".to_string(),
            allowed_guilds: Vec::new(),
        }
    }
}

impl DiscordConfig {
    /// Check if a guild is allowed
    pub fn is_guild_allowed(&self, guild_id: u64) -> bool {
        self.allowed_guilds.is_empty() || self.allowed_guilds.contains(&guild_id)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON blob per guild
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs_next::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".notifymeon")
                .join("guilds"),
        }
    }
}

/// Notification behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyOptions {
    /// Recent events kept per guild for replay
    pub history_capacity: usize,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            history_capacity: 50,
        }
    }
}
