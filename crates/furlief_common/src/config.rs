//! Configuration for the Furlief waitlist service.
//!
//! Loads settings from $FURLIEF_CONFIG, /etc/furlief/config.toml or
//! /var/lib/furlief/config.toml, in that order, or uses defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "FURLIEF_CONFIG";

/// Config file path
pub const CONFIG_PATH: &str = "/etc/furlief/config.toml";

/// Fallback config file path
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/furlief/config.toml";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the daemon listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public site origin, used to build referral links
    #[serde(default = "default_public_origin")]
    pub public_origin: String,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Origins allowed by CORS (empty: same-origin only)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7870".to_string()
}

fn default_public_origin() -> String {
    "https://furlief.com".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_origin: default_public_origin(),
            max_body_bytes: default_max_body_bytes(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/furlief/waitlist.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Admin API access. No tokens means every admin request is refused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl AdminConfig {
    pub fn is_enabled(&self) -> bool {
        self.tokens.iter().any(|t| !t.is_empty())
    }

    pub fn accepts(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.iter().any(|t| t == token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistConfig {
    /// Count shown publicly when the store cannot be reached
    #[serde(default = "default_fallback_total")]
    pub fallback_total: u64,

    /// Dashboard page size
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_fallback_total() -> u64 {
    2547
}

fn default_page_size() -> usize {
    50
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            fallback_total: default_fallback_total(),
            page_size: default_page_size(),
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub waitlist: WaitlistConfig,
}

impl Config {
    /// Load config from the first readable location, or return defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            match Self::load_from_path(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to load {} from ${}: {:#}", path, CONFIG_ENV, e),
            }
        }

        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write the default config, for first-time setup
    pub fn save_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Wrote default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:7870");
        assert_eq!(config.waitlist.fallback_total, 2547);
        assert_eq!(config.waitlist.page_size, 50);
        assert!(!config.admin.is_enabled());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            public_origin = "https://staging.furlief.com"

            [admin]
            tokens = ["s3cret"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.public_origin, "https://staging.furlief.com");
        assert_eq!(config.server.max_body_bytes, 64 * 1024);
        assert!(config.admin.accepts("s3cret"));
        assert!(!config.admin.accepts("guess"));
        assert!(!config.admin.accepts(""));
        assert_eq!(config.store.db_path, PathBuf::from("/var/lib/furlief/waitlist.db"));
    }

    #[test]
    fn test_save_and_load_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::save_default(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.bind_addr, Config::default().server.bind_addr);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml("[server\nbind_addr = 1").is_err());
    }
}
