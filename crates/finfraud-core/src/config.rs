//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend address, which credential store to use, an optional request
//! timeout, an optional log directory and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/finfraud/config.json`. The
//! `FINFRAUD_API_BASE` and `FINFRAUD_STORE` environment variables override
//! the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, DEFAULT_API_BASE};
use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, SharedTokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "finfraud";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_BASE: &str = "FINFRAUD_API_BASE";
pub const ENV_STORE: &str = "FINFRAUD_STORE";

/// Where the credential is kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Nothing persisted; every run starts anonymous
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "keyring" => Ok(StoreBackend::Keyring),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown credential store '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub store: StoreBackend,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub last_email: Option<String>,
    /// Set from the command line; beats both environment and file
    #[serde(skip)]
    api_base_override: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed credential
    pub fn token_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Pin the backend address regardless of environment or file
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_override = Some(base.into());
        self
    }

    /// Backend address: explicit override, environment, config file, default
    pub fn api_base(&self) -> String {
        self.resolve_api_base(std::env::var(ENV_API_BASE).ok())
    }

    fn resolve_api_base(&self, from_env: Option<String>) -> String {
        self.api_base_override
            .clone()
            .or_else(|| from_env.filter(|s| !s.trim().is_empty()))
            .or_else(|| self.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn store_backend(&self) -> Result<StoreBackend> {
        self.resolve_store_backend(std::env::var(ENV_STORE).ok())
    }

    fn resolve_store_backend(&self, from_env: Option<String>) -> Result<StoreBackend> {
        match from_env.filter(|s| !s.trim().is_empty()) {
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid {} value", ENV_STORE)),
            None => Ok(self.store),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn open_token_store(&self) -> Result<SharedTokenStore> {
        let store: SharedTokenStore = match self.store_backend()? {
            StoreBackend::File => Arc::new(FileTokenStore::new(self.token_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringTokenStore::new()),
            StoreBackend::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }

    /// API client wired to the configured backend and credential store
    pub fn build_api_client(&self) -> Result<ApiClient> {
        let store = self.open_token_store()?;
        ApiClient::with_timeout(self.api_base(), store, self.request_timeout())
            .context("Failed to build HTTP client")
    }
}
