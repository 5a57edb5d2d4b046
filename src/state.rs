// src/state.rs

//! Local record of created orgs and in-flight requests (`state.yaml`).
//!
//! Lives next to config.yaml. Written by the CLI only; safe to delete.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::provision::{CreateRequest, JobId, ScratchOrgResult};
use crate::util::{ensure_dir, read_to_string};

/// Per-org options that outlive the `create` call.
///
/// Never holds the connected-app secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgSettings {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub set_default: bool,
    #[serde(default = "default_true")]
    pub tracks_source: bool,
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl OrgSettings {
    pub fn from_request(request: &CreateRequest) -> Self {
        Self {
            alias: request.alias.clone(),
            set_default: request.set_default,
            tracks_source: request.tracks_source,
            client_id: request.client_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub org_id: String,
    pub dev_hub: String,
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub settings: OrgSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingJob {
    pub hub: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub settings: OrgSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub default_org: Option<String>,

    /// Keyed by username.
    #[serde(default)]
    pub orgs: BTreeMap<String, OrgRecord>,

    /// Keyed by job id.
    #[serde(default)]
    pub pending: BTreeMap<String, PendingJob>,
}

impl State {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse state file {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let raw = serde_yaml::to_string(self).context("Failed to serialize state")?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write state file {:?}", path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {:?}", path))?;
        }

        Ok(())
    }

    pub fn add_pending(&mut self, job_id: &JobId, hub: &str, settings: OrgSettings) {
        self.pending.insert(
            job_id.to_string(),
            PendingJob {
                hub: hub.to_string(),
                submitted_at: Utc::now(),
                settings,
            },
        );
    }

    /// Save an active org; `set_default` makes it the default (by alias if it has one).
    pub fn record_org(&mut self, hub: &str, result: &ScratchOrgResult, settings: OrgSettings) {
        let field = |name: &str| {
            result
                .auth_fields
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        if settings.set_default {
            self.default_org = Some(
                settings
                    .alias
                    .clone()
                    .unwrap_or_else(|| result.username.clone()),
            );
        }

        self.orgs.insert(
            result.username.clone(),
            OrgRecord {
                org_id: result.org_id.clone(),
                dev_hub: hub.to_string(),
                login_url: field("loginUrl"),
                expiration_date: field("expirationDate"),
                created_at: Utc::now(),
                settings,
            },
        );
    }
}
