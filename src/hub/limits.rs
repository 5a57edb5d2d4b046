// src/hub/limits.rs

//! Scratch org capacity checks.
//!
//! The hub exposes a limits resource shaped like:
//!
//! {
//!   "ActiveScratchOrgs": { "Max": 3, "Remaining": 2 },
//!   "DailyScratchOrgs":  { "Max": 6, "Remaining": 6 },
//!   ...
//! }
//!
//! A hub can provision only when both scratch org counters have
//! something left.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::DevHub;

pub const ACTIVE_SCRATCH_ORGS: &str = "ActiveScratchOrgs";
pub const DAILY_SCRATCH_ORGS: &str = "DailyScratchOrgs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiLimit {
    pub name: String,
    pub max: i64,
    pub remaining: i64,
}

impl ApiLimit {
    pub fn new(name: impl Into<String>, max: i64, remaining: i64) -> Self {
        Self {
            name: name.into(),
            max,
            remaining,
        }
    }
}

/// Flatten the remote `name → { Max, Remaining }` map into a list.
///
/// Entries without both numbers are skipped.
pub fn flatten_limits(raw: &Value) -> Result<Vec<ApiLimit>> {
    let obj = raw
        .as_object()
        .context("Limits response must be a JSON object")?;

    let limits = obj
        .iter()
        .filter_map(|(name, v)| {
            let max = v.get("Max").and_then(Value::as_i64)?;
            let remaining = v.get("Remaining").and_then(Value::as_i64)?;
            Some(ApiLimit::new(name.clone(), max, remaining))
        })
        .collect();

    Ok(limits)
}

fn remaining(limits: &[ApiLimit], name: &str) -> i64 {
    limits
        .iter()
        .find(|l| l.name == name)
        .map(|l| l.remaining)
        .unwrap_or(0)
}

/// True iff both active and daily scratch org counters have remaining > 0.
///
/// A missing counter counts as zero.
pub fn has_capacity(limits: &[ApiLimit]) -> bool {
    remaining(limits, ACTIVE_SCRATCH_ORGS) > 0 && remaining(limits, DAILY_SCRATCH_ORGS) > 0
}

/// Fetch limits from the hub and apply `has_capacity`.
pub async fn check_capacity<H: DevHub + ?Sized>(hub: &H) -> Result<bool> {
    let limits = hub.fetch_limits().await?;
    let ok = has_capacity(&limits);

    tracing::debug!(
        hub = hub.id(),
        active_remaining = remaining(&limits, ACTIVE_SCRATCH_ORGS),
        daily_remaining = remaining(&limits, DAILY_SCRATCH_ORGS),
        has_capacity = ok,
        "checked scratch org capacity"
    );

    Ok(ok)
}
