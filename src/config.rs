// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, time::Duration};

use crate::util::read_to_string;

/// Root configuration loaded from `config.yaml`.
///
/// This file controls:
/// - Which dev hubs can be targeted (and how to reach them)
/// - How often provisioning status is polled
/// - Default log level
///
/// A missing file is not an error: every hub lookup will fail instead,
/// naming the path that was searched.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Dev hubs keyed by alias.
    #[serde(default)]
    pub hubs: BTreeMap<String, HubEntry>,

    #[serde(default)]
    pub provision: ProvisionSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// One dev hub.
///
/// Example in config.yaml:
///
/// hubs:
///   my-hub:
///     username: admin@example.com
///     instance_url: https://example.my.salesforce.com
///     api_version: "61.0"
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HubEntry {
    #[serde(default)]
    pub username: Option<String>,

    /// Base URL for REST calls. Required to provision.
    #[serde(default)]
    pub instance_url: Option<String>,

    #[serde(default)]
    pub api_version: Option<String>,

    /// Prefer `SCRATCHORG_HUB_TOKEN_<ALIAS>` over storing this here.
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ProvisionSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load and parse `config.yaml` from disk.
    ///
    /// Returns the default (empty) config when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = read_to_string(path)?;
        Self::parse(&raw).with_context(|| format!("Failed to parse YAML config {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // An empty file deserialises to null; treat it like a missing one.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    /// Find a hub by alias first, then by username.
    pub fn find_hub(&self, id: &str) -> Option<(&str, &HubEntry)> {
        if let Some((alias, entry)) = self.hubs.get_key_value(id) {
            return Some((alias.as_str(), entry));
        }

        self.hubs
            .iter()
            .find(|(_, entry)| entry.username.as_deref() == Some(id))
            .map(|(alias, entry)| (alias.as_str(), entry))
    }
}
