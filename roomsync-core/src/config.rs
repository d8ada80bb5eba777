//! Global roomsync configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::appointment::ResourceId;
use crate::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_PROVIDER, DEFAULT_WINDOW_MONTHS};
use crate::error::{RoomSyncError, RoomSyncResult};
use crate::gateway::{ResourceDirectory, StaticDirectory};
use crate::remote::Remote;
use crate::remote::protocol::ProviderConfig;
use crate::remote::provider::Provider;

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_poll_interval() -> String {
    DEFAULT_POLL_INTERVAL.to_string()
}

fn default_window_months() -> u32 {
    DEFAULT_WINDOW_MONTHS
}

/// Configuration at ~/.config/roomsync/config.toml, overridable with
/// `ROOMSYNC_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSyncConfig {
    /// Provider name; the binary is `roomsync-provider-{provider}`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Explicit provider binary, bypassing the PATH lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_path: Option<PathBuf>,

    /// Time between polls, e.g. "5s" or "1m 30s"
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_window_months")]
    pub window_months: u32,

    /// Fixed resource list. When unset, resources come from the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceId>>,

    /// Passed verbatim to the provider with every request
    #[serde(default)]
    pub provider_config: ProviderConfig,
}

impl Default for RoomSyncConfig {
    fn default() -> Self {
        RoomSyncConfig {
            provider: default_provider(),
            provider_path: None,
            poll_interval: default_poll_interval(),
            window_months: default_window_months(),
            resources: None,
            provider_config: ProviderConfig::new(),
        }
    }
}

impl RoomSyncConfig {
    pub fn config_path() -> RoomSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RoomSyncError::Config("Could not determine config directory".into()))?
            .join("roomsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented template on first run.
    pub fn load() -> RoomSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::build(&config_path, true)
    }

    /// Load a specific file, without environment overrides.
    pub fn load_from(path: &Path) -> RoomSyncResult<Self> {
        Self::build(path, false)
    }

    fn build(path: &Path, with_env: bool) -> RoomSyncResult<Self> {
        let mut builder = Config::builder().add_source(File::from(path).required(false));

        if with_env {
            builder = builder.add_source(Environment::with_prefix("ROOMSYNC").try_parsing(true));
        }

        builder
            .build()
            .map_err(|e| RoomSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RoomSyncError::Config(e.to_string()))
    }

    pub fn poll_interval(&self) -> RoomSyncResult<Duration> {
        humantime::parse_duration(&self.poll_interval).map_err(|e| {
            RoomSyncError::Config(format!("Invalid poll_interval '{}': {e}", self.poll_interval))
        })
    }

    pub fn remote(&self) -> Remote {
        let provider = match &self.provider_path {
            Some(path) => {
                let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
                Provider::from_path(&self.provider, expanded)
            }
            None => Provider::from_name(&self.provider),
        };

        Remote::new(provider, self.provider_config.clone())
    }

    /// The configured resource list if there is one, otherwise the provider.
    pub fn directory(&self) -> Arc<dyn ResourceDirectory> {
        match &self.resources {
            Some(resources) => Arc::new(StaticDirectory(resources.clone())),
            None => Arc::new(self.remote()),
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> RoomSyncResult<()> {
        let contents = format!(
            "\
# roomsync configuration

# Provider binary to use (roomsync-provider-<name> in PATH):
# provider = \"{DEFAULT_PROVIDER}\"

# How often to poll:
# poll_interval = \"{DEFAULT_POLL_INTERVAL}\"

# Months of calendar to fetch, starting today:
# window_months = {DEFAULT_WINDOW_MONTHS}

# Skip discovery and mirror only these resources:
# resources = [\"room1@example.com\"]

# Settings passed to the provider:
# [provider_config]
# root = \"~/rooms\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RoomSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RoomSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
