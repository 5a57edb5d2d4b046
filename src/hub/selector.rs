// src/hub/selector.rs

use clap::ValueEnum;

use super::{check_capacity, DevHub, HubConnector};
use crate::error::CreateError;

/// What to do when one candidate hub cannot be reached or queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProbePolicy {
    /// Surface the first connection or limits error unchanged.
    #[default]
    FailFast,
    /// Log the error and move on to the next candidate.
    SkipUnavailable,
}

/// Pick the first candidate (in caller order) with scratch org capacity.
///
/// Candidates are probed one at a time; later entries are never touched
/// once a hub qualifies. A hub without an instance URL is
/// `MissingInstanceUrl` under `FailFast` and skipped otherwise; its limits
/// are never requested.
pub async fn select_hub<C: HubConnector>(
    connector: &C,
    candidates: &[String],
    policy: ProbePolicy,
) -> Result<C::Hub, CreateError> {
    for id in candidates {
        let hub = match connector.connect(id).await {
            Ok(hub) => hub,
            Err(e) => {
                unavailable(policy, id, e)?;
                continue;
            }
        };

        if hub.instance_url().map_or(true, |u| u.trim().is_empty()) {
            let err = CreateError::MissingInstanceUrl {
                hub: hub.id().to_string(),
            };
            match policy {
                ProbePolicy::FailFast => return Err(err),
                ProbePolicy::SkipUnavailable => {
                    tracing::warn!(hub = %id, error = %err, "skipping unavailable dev hub");
                    continue;
                }
            }
        }

        match check_capacity(&hub).await {
            Ok(true) => {
                tracing::info!(hub = %id, "selected dev hub");
                return Ok(hub);
            }
            Ok(false) => {
                tracing::info!(hub = %id, "dev hub has no scratch org capacity");
            }
            Err(e) => unavailable(policy, id, e)?,
        }
    }

    Err(CreateError::NoHubCapacity {
        candidates: candidates.join(", "),
    })
}

fn unavailable(policy: ProbePolicy, id: &str, e: anyhow::Error) -> Result<(), CreateError> {
    match policy {
        ProbePolicy::FailFast => Err(CreateError::Other(e)),
        ProbePolicy::SkipUnavailable => {
            tracing::warn!(hub = %id, error = %format!("{e:#}"), "skipping unavailable dev hub");
            Ok(())
        }
    }
}
