// src/provision/rest.rs

//! Provisioning over the hub's REST API.
//!
//! Flow:
//! 1. POST a `ScratchOrgInfo` record built from the org config
//! 2. Return straight away when the wait is zero (async)
//! 3. Otherwise poll the record until it is Active, fails, or the wait runs out
//!
//! Polling uses a fixed interval from config.yaml. No backoff, no retries.

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};
use std::time::Duration;
use tokio::time::Instant;

use super::{
    CreateRequest, EventSink, JobId, ProvisionEvent, ProvisionResponse, Provisioner,
    ScratchOrgResult,
};
use crate::error::{ProvisionError, ProvisionErrorKind};
use crate::hub::client::HubClient;
use crate::hub::rest::RestHub;

const SCRATCH_ORG_INFO: &str = "sobjects/ScratchOrgInfo";

/// camelCase definition key → ScratchOrgInfo field.
const FIELD_MAP: &[(&str, &str)] = &[
    ("orgName", "OrgName"),
    ("edition", "Edition"),
    ("description", "Description"),
    ("username", "Username"),
    ("adminEmail", "AdminEmail"),
    ("release", "Release"),
    ("sourceOrg", "SourceOrg"),
    ("snapshot", "Snapshot"),
    ("country", "Country"),
    ("language", "Language"),
    ("hasSampleData", "HasSampleData"),
    ("features", "Features"),
    ("instance", "Instance"),
];

/// Keys we accept but take from elsewhere in the request.
const SUPERSEDED_KEYS: &[&str] = &["durationDays"];

pub struct RestProvisioner {
    poll_interval: Duration,
}

impl RestProvisioner {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    async fn poll(
        &self,
        client: &HubClient,
        job_id: &JobId,
        wait: Duration,
        mut sink: Option<&mut dyn EventSink>,
    ) -> Result<JsonValue, ProvisionError> {
        let deadline = Instant::now() + wait;
        let path = format!("{}/{}", SCRATCH_ORG_INFO, job_id);
        let mut last_status: Option<String> = None;

        loop {
            let record = client
                .get_record(&path)
                .await
                .map_err(|e| e.with_job(job_id.clone()))?;

            let status = record
                .get("Status")
                .and_then(JsonValue::as_str)
                .unwrap_or("Unknown")
                .to_string();

            if last_status.as_deref() != Some(status.as_str()) {
                tracing::info!(job_id = %job_id, status = %status, "scratch org status");
                emit(&mut sink, ProvisionEvent::status(job_id.clone(), status.clone()));
                last_status = Some(status.clone());
            }

            match status.as_str() {
                "Active" => {
                    emit(&mut sink, ProvisionEvent::completed(job_id.clone()));
                    return Ok(record);
                }
                "Error" => {
                    let code = record
                        .get("ErrorCode")
                        .and_then(JsonValue::as_str)
                        .unwrap_or("unknown error");
                    return Err(ProvisionError::new(
                        ProvisionErrorKind::Rejected,
                        format!("Scratch org request {} failed: {}", job_id, code),
                    )
                    .with_job(job_id.clone()));
                }
                "Deleted" => {
                    return Err(ProvisionError::new(
                        ProvisionErrorKind::Rejected,
                        format!("Scratch org request {} was deleted", job_id),
                    )
                    .with_job(job_id.clone()));
                }
                _ => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ProvisionError::timeout(
                    job_id.clone(),
                    format!(
                        "Scratch org request {} still {} after {}s",
                        job_id,
                        status,
                        wait.as_secs()
                    ),
                ));
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl Provisioner for RestProvisioner {
    type Hub = RestHub;

    async fn create(
        &self,
        hub: &RestHub,
        request: &CreateRequest,
        mut sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError> {
        let secret_missing = request
            .client_secret
            .as_ref()
            .map_or(true, |s| s.expose().is_empty());
        if request.client_id.is_some() && secret_missing {
            return Err(ProvisionError::new(
                ProvisionErrorKind::Rejected,
                "A connected app client id was given without its client secret",
            ));
        }
        let client = hub_client(hub)?;

        let (body, warnings) = scratch_org_info_body(request);
        let created = client.post_record(SCRATCH_ORG_INFO, &body).await?;
        let job_id = parse_created_id(&created)?;

        tracing::info!(hub = hub.alias(), job_id = %job_id, "submitted scratch org request");
        emit(&mut sink, ProvisionEvent::submitted(job_id.clone()));

        if request.wait.is_zero() {
            return Ok(ProvisionResponse {
                job_id,
                result: None,
            });
        }

        let record = self
            .poll(client, &job_id, request.wait, sink)
            .await?;
        let result = build_result(hub, &job_id, record, warnings, request.client_id.as_deref())?;

        Ok(ProvisionResponse {
            job_id,
            result: Some(result),
        })
    }

    async fn resume(
        &self,
        hub: &RestHub,
        job_id: &JobId,
        wait: Duration,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<ProvisionResponse, ProvisionError> {
        let client = hub_client(hub)?;
        let record = self.poll(client, job_id, wait, sink).await?;
        let result = build_result(hub, job_id, record, Vec::new(), None)?;

        Ok(ProvisionResponse {
            job_id: job_id.clone(),
            result: Some(result),
        })
    }
}

fn emit(sink: &mut Option<&mut dyn EventSink>, event: ProvisionEvent) {
    if let Some(s) = sink.as_deref_mut() {
        s.emit(event);
    }
}

fn hub_client(hub: &RestHub) -> Result<&HubClient, ProvisionError> {
    hub.client().ok_or_else(|| {
        ProvisionError::new(
            ProvisionErrorKind::Rejected,
            format!("Dev hub '{}' has no instance URL", hub.alias()),
        )
    })
}

/* ---------------- payload build ---------------- */

/// Build the ScratchOrgInfo payload; unknown definition keys become warnings.
pub fn scratch_org_info_body(request: &CreateRequest) -> (JsonValue, Vec<String>) {
    let mut body = Map::new();
    let mut warnings = Vec::new();

    for (key, value) in &request.org_config {
        if SUPERSEDED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let Some((_, field)) = FIELD_MAP.iter().find(|(k, _)| *k == key.as_str()) else {
            warnings.push(format!(
                "Definition key '{}' is not supported and was ignored",
                key
            ));
            continue;
        };

        let value = match (key.as_str(), value) {
            ("features", JsonValue::Array(items)) => JsonValue::String(
                items
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .collect::<Vec<_>>()
                    .join(";"),
            ),
            _ => value.clone(),
        };

        body.insert(field.to_string(), value);
    }

    body.insert("DurationDays".into(), json!(request.duration_days));

    if request.no_ancestors {
        body.insert("NoAncestors".into(), JsonValue::Bool(true));
    }
    if request.no_namespace {
        body.insert("Namespace".into(), JsonValue::Null);
    }
    if let Some(id) = &request.client_id {
        body.insert("ConnectedAppConsumerKey".into(), JsonValue::String(id.clone()));
    }

    (JsonValue::Object(body), warnings)
}

fn parse_created_id(resp: &JsonValue) -> Result<JobId, ProvisionError> {
    if resp.get("success").and_then(JsonValue::as_bool) == Some(false) {
        let errors = resp
            .get("errors")
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(ProvisionError::new(
            ProvisionErrorKind::Rejected,
            format!("Scratch org request was rejected: {}", errors),
        ));
    }

    resp.get("id")
        .and_then(JsonValue::as_str)
        .filter(|id| !id.is_empty())
        .map(JobId::from)
        .ok_or_else(|| {
            ProvisionError::new(
                ProvisionErrorKind::InvalidResponse,
                "Scratch org request returned no id",
            )
        })
}

fn build_result(
    hub: &RestHub,
    job_id: &JobId,
    record: JsonValue,
    warnings: Vec<String>,
    client_id: Option<&str>,
) -> Result<ScratchOrgResult, ProvisionError> {
    let field = |name: &str| {
        record
            .get(name)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
    };

    let missing = |name: &str| {
        ProvisionError::new(
            ProvisionErrorKind::InvalidResponse,
            format!("Active scratch org record is missing {}", name),
        )
        .with_job(job_id.clone())
    };

    let username = field("SignupUsername").ok_or_else(|| missing("SignupUsername"))?;
    let org_id = field("ScratchOrg").ok_or_else(|| missing("ScratchOrg"))?;
    let login_url = field("LoginUrl");

    let auth_fields = json!({
        "username": username,
        "orgId": org_id,
        "instanceUrl": login_url,
        "loginUrl": login_url,
        "devHubUsername": hub.username(),
        "devHub": hub.alias(),
        "expirationDate": field("ExpirationDate"),
        "clientId": client_id,
    });

    Ok(ScratchOrgResult {
        username,
        org_id,
        scratch_org_info: record,
        auth_fields,
        warnings,
    })
}
