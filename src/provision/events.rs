use chrono::{DateTime, Utc};
use serde::Serialize;

use super::JobId;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "status")]
pub enum ProvisionEventKind {
    Submitted,
    StatusChanged(String),
    Completed,
}

#[derive(Debug, Serialize, Clone)]
pub struct ProvisionEvent {
    pub job_id: JobId,
    pub kind: ProvisionEventKind,
    pub timestamp: DateTime<Utc>,
}

impl ProvisionEvent {
    pub fn new(job_id: JobId, kind: ProvisionEventKind) -> Self {
        Self {
            job_id,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn submitted(job_id: JobId) -> Self {
        Self::new(job_id, ProvisionEventKind::Submitted)
    }

    pub fn status(job_id: JobId, status: impl Into<String>) -> Self {
        Self::new(job_id, ProvisionEventKind::StatusChanged(status.into()))
    }

    pub fn completed(job_id: JobId) -> Self {
        Self::new(job_id, ProvisionEventKind::Completed)
    }
}
