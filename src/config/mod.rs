//! Configuration loading
//!
//! Settings come from an optional `config.toml` in the platform config
//! directory. Every field has a default, so a missing file is fine.

use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Names of the secrets resolved from the vault at startup.
pub const SPOTIFY_CLIENT_ID: &str = "spotify_client_id";
pub const SPOTIFY_CLIENT_SECRET: &str = "spotify_client_secret";
pub const VK_TOKEN: &str = "vk_fake_token";

pub const REQUIRED_SECRETS: [&str; 3] = [SPOTIFY_CLIENT_SECRET, SPOTIFY_CLIENT_ID, VK_TOKEN];

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Persisted Spotify token (JSON, rewritten after every refresh)
    pub token_path: PathBuf,
    pub vault: VaultSettings,
    pub spotify: SpotifySettings,
    pub vk: VkSettings,
    pub status: StatusSettings,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub url: String,
    /// Bootstrap `username:password` file
    pub credentials_path: PathBuf,
    /// KV v2 mount point
    pub mount: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotifySettings {
    pub token_url: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VkSettings {
    pub api_base: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    /// Prefix shown before the track
    pub label: String,
    /// A paused track older than this renders as an empty status
    pub idle_clear_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub active_interval_secs: u64,
    pub idle_interval_secs: u64,
    /// Per-request timeout applied to every outbound HTTP call
    pub request_timeout_secs: u64,
    /// Keep the previous status when a publish fails, so the next cycle retries it
    pub retain_status_on_failed_publish: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("resources/spotify_auth.json"),
            vault: VaultSettings::default(),
            spotify: SpotifySettings::default(),
            vk: VkSettings::default(),
            status: StatusSettings::default(),
            poll: PollSettings::default(),
        }
    }
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            url: "http://vault:8200".to_string(),
            credentials_path: PathBuf::from("/run/secrets/vkotify_vault"),
            mount: "secret".to_string(),
        }
    }
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base: "https://api.spotify.com/v1".to_string(),
        }
    }
}

impl Default for VkSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.vk.com/method".to_string(),
            api_version: "5.124".to_string(),
        }
    }
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            label: "Где-то на просторах Spotify".to_string(),
            idle_clear_secs: crate::status::DEFAULT_IDLE_CLEAR.as_secs(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            active_interval_secs: 5,
            idle_interval_secs: 5,
            request_timeout_secs: 10,
            retain_status_on_failed_publish: false,
        }
    }
}

impl PollSettings {
    pub fn active_interval(&self) -> Duration {
        Duration::from_secs(self.active_interval_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Settings {
    /// Get config file path
    fn config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("com", "vkotify", "vkotify").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load settings from the platform config directory, or defaults if absent
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from an explicit path, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
