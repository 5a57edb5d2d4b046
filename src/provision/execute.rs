// src/provision/execute.rs

use std::time::Duration;

use super::{CreateRequest, EventSink, JobId, ProvisionResponse, Provisioner, ScratchOrgResult};
use crate::error::CreateError;
use crate::hub::DevHub;

/// How a delegate call ended, short of an error.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// The org is active.
    Completed {
        job_id: JobId,
        result: ScratchOrgResult,
    },
    /// Async request accepted; the org is still being built.
    Queued { job_id: JobId },
}

/// Hand a request to the provisioning delegate.
///
/// - Refuses hubs without an instance URL before anything is submitted.
/// - Async requests never get a progress sink.
/// - A sync call that "succeeds" without a result is `EmptyResult`.
/// - A timeout from the delegate becomes `CreateError::Timeout`.
pub async fn invoke<P: Provisioner>(
    provisioner: &P,
    hub: &P::Hub,
    request: &CreateRequest,
    sink: Option<&mut dyn EventSink>,
) -> Result<Invocation, CreateError> {
    if hub.instance_url().map_or(true, |u| u.trim().is_empty()) {
        return Err(CreateError::MissingInstanceUrl {
            hub: hub.id().to_string(),
        });
    }

    let sink = if request.is_async() { None } else { sink };

    let response = provisioner.create(hub, request, sink).await?;
    finish(response, request.is_async())
}

/// Keep waiting on an earlier request.
pub async fn resume<P: Provisioner>(
    provisioner: &P,
    hub: &P::Hub,
    job_id: &JobId,
    wait: Duration,
    sink: Option<&mut dyn EventSink>,
) -> Result<Invocation, CreateError> {
    let response = provisioner.resume(hub, job_id, wait, sink).await?;
    finish(response, false)
}

fn finish(response: ProvisionResponse, is_async: bool) -> Result<Invocation, CreateError> {
    match response.result {
        Some(result) => Ok(Invocation::Completed {
            job_id: response.job_id,
            result,
        }),
        None if is_async => Ok(Invocation::Queued {
            job_id: response.job_id,
        }),
        None => Err(CreateError::EmptyResult),
    }
}
