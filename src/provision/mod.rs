use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::time::Duration;

use crate::error::ProvisionError;
use crate::hub::DevHub;

pub mod events;
pub mod execute;
pub mod options;
pub mod rest;
pub mod sink;

pub use events::{ProvisionEvent, ProvisionEventKind};
pub use execute::{invoke, resume, Invocation};
pub use options::{build_request, load_definition};
pub use sink::EventSink;

/* ---------------- identifiers ---------------- */

/// Server-side id of a scratch org request (a `ScratchOrgInfo` record).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value that must never show up in logs or Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/* ---------------- request ---------------- */

/// Everything the provisioning delegate needs for one scratch org.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Definition-file keys overlaid with explicit flags (camelCase keys).
    pub org_config: Map<String, JsonValue>,
    pub duration_days: u8,
    pub no_ancestors: bool,
    pub no_namespace: bool,
    /// Zero means "submit and return the job id".
    pub wait: Duration,
    pub alias: Option<String>,
    pub set_default: bool,
    pub tracks_source: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
}

impl CreateRequest {
    pub fn is_async(&self) -> bool {
        self.wait.is_zero()
    }
}

/* ---------------- result ---------------- */

/// Snapshot returned once a scratch org is active.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScratchOrgResult {
    pub username: String,
    pub org_id: String,
    pub scratch_org_info: JsonValue,
    pub auth_fields: JsonValue,
    pub warnings: Vec<String>,
}

/// What the delegate reports back after a successful call.
#[derive(Debug, Clone)]
pub struct ProvisionResponse {
    pub job_id: JobId,
    /// `None` when the call returned before the org was ready.
    pub result: Option<ScratchOrgResult>,
}

/* ---------------- delegate ---------------- */

/// The provisioning workflow. Owns submission, polling and timeouts.
#[async_trait]
pub trait Provisioner: Send + Sync {
    type Hub: DevHub;

    /// Submit a new request and wait up to `request.wait`.
    ///
    /// `sink`, when present, receives progress events.
    async fn create(
        &self,
        hub: &Self::Hub,
        request: &CreateRequest,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError>;

    /// Keep waiting on a request submitted earlier.
    async fn resume(
        &self,
        hub: &Self::Hub,
        job_id: &JobId,
        wait: Duration,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError>;
}
