// src/error.rs

use thiserror::Error;

use crate::provision::JobId;

/// Exit code for a provisioning run that outlived `--wait`.
///
/// The job keeps running server side; callers can tell "still running"
/// apart from "failed" and resume.
pub const TIMEOUT_EXIT_CODE: u8 = 69;

/// What went wrong inside the provisioning delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionErrorKind {
    /// Wait elapsed before the org became active.
    Timeout,
    /// The hub refused or failed the request.
    Rejected,
    /// Network or HTTP level failure.
    Transport,
    /// The hub answered with something we cannot read.
    InvalidResponse,
}

/// Error returned across the provisioning delegate boundary.
///
/// Callers branch on `kind`, never on the message.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProvisionError {
    pub kind: ProvisionErrorKind,
    pub message: String,
    pub job_id: Option<JobId>,
}

impl ProvisionError {
    pub fn new(kind: ProvisionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            job_id: None,
        }
    }

    pub fn timeout(job_id: JobId, message: impl Into<String>) -> Self {
        Self {
            kind: ProvisionErrorKind::Timeout,
            message: message.into(),
            job_id: Some(job_id),
        }
    }

    pub fn with_job(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::new(ProvisionErrorKind::InvalidResponse, err.to_string())
        } else {
            Self::new(ProvisionErrorKind::Transport, err.to_string())
        }
    }
}

/// Outcomes of `create` / `resume` other than success.
#[derive(Error, Debug)]
pub enum CreateError {
    #[error("No dev hub has scratch org capacity left (tried: {candidates})")]
    NoHubCapacity { candidates: String },

    #[error("Dev hub '{hub}' has no instance URL")]
    MissingInstanceUrl { hub: String },

    #[error(
        "Scratch org job {} did not finish within the wait time",
        .job_id.as_ref().map_or("(unknown)", |j| j.as_str())
    )]
    Timeout { job_id: Option<JobId> },

    #[error("Provisioning reported success but returned no scratch org")]
    EmptyResult,

    #[error(transparent)]
    Provision(ProvisionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CreateError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CreateError::Timeout { .. } => TIMEOUT_EXIT_CODE,
            _ => 1,
        }
    }
}

impl From<ProvisionError> for CreateError {
    fn from(err: ProvisionError) -> Self {
        match err.kind {
            ProvisionErrorKind::Timeout => CreateError::Timeout { job_id: err.job_id },
            _ => CreateError::Provision(err),
        }
    }
}
