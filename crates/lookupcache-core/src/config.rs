//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which includes
//! the API base URL, request timeout, staleness threshold, log file and the
//! username whose token is kept in the OS keychain.
//!
//! Configuration is stored at `~/.config/lookupcache/config.json`. A few
//! environment variables override the file so deployments can point the
//! client elsewhere without editing it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::CredentialStore;

/// Application name used for config directory paths
const APP_NAME: &str = "lookupcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API base URL used when neither the file nor the environment sets one.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Lookup tables change rarely; an hour-old copy is still considered fresh.
pub const DEFAULT_STALE_AFTER_MINUTES: i64 = 60;

pub const ENV_API_URL: &str = "LOOKUPCACHE_API_URL";
pub const ENV_TOKEN: &str = "LOOKUPCACHE_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "LOOKUPCACHE_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub stale_after_minutes: i64,
    pub log_file: Option<PathBuf>,
    pub username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stale_after_minutes: DEFAULT_STALE_AFTER_MINUTES,
            log_file: None,
            username: None,
        }
    }
}

impl Config {
    /// The config file (or defaults), without environment overrides.
    /// Start from this when the result is going to be saved; otherwise
    /// follow up with [`Config::apply_env_overrides`].
    pub fn load_stored() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply `LOOKUPCACHE_*` overrides using the given variable lookup.
    ///
    /// Returns a message for every override that was ignored, so the caller
    /// can report them once logging is up.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut ignored = Vec::new();
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => ignored.push(format!("Ignoring invalid {}: {:?}", ENV_TIMEOUT_SECS, raw)),
            }
        }
        ignored
    }

    /// Bearer token for API calls: the environment first, then the keychain
    /// entry of the configured user.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = std::env::var(ENV_TOKEN).ok().filter(|t| !t.is_empty()) {
            return Some(token);
        }
        let username = self.username.as_deref()?;
        match CredentialStore::get_token(username) {
            Ok(Some(token)) => Some(token),
            Ok(None) => {
                debug!(username, "No stored API token");
                None
            }
            Err(e) => {
                warn!(username, error = %e, "Could not read API token from keychain");
                None
            }
        }
    }
}
