// src/provision/options.rs

//! Assemble a `CreateRequest` from flags and an optional definition file.
//!
//! Order matters:
//! 1. definition-file keys
//! 2. explicit flags (overwrite matching keys)
//! 3. derived values (async wait, edition spelling)

use anyhow::{Context, Result};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use std::time::Duration;

use super::{CreateRequest, Secret};
use crate::cli::CreateArgs;
use crate::util::read_to_string;

/// Load a scratch org definition file. It must hold a JSON object.
pub fn load_definition(path: &Path) -> Result<Map<String, JsonValue>> {
    let raw = read_to_string(path)?;
    let parsed: JsonValue = serde_json::from_str(&raw)
        .with_context(|| format!("Definition file is not valid JSON: {}", path.display()))?;

    match parsed {
        JsonValue::Object(map) => Ok(map),
        _ => anyhow::bail!(
            "Definition file must contain a JSON object: {}",
            path.display()
        ),
    }
}

/// `partner-developer` → `partner developer`; anything else is unchanged.
pub fn normalize_edition(edition: &str) -> String {
    match edition.strip_prefix("partner-") {
        Some(rest) => format!("partner {}", rest),
        None => edition.to_string(),
    }
}

/// Build the request handed to the provisioning delegate.
pub fn build_request(
    args: &CreateArgs,
    definition: Option<Map<String, JsonValue>>,
    client_secret: Option<Secret>,
) -> CreateRequest {
    let mut org_config = definition.unwrap_or_default();

    let overrides: [(&str, Option<String>); 8] = [
        ("edition", args.edition.map(|e| normalize_edition(e.as_str()))),
        ("username", args.username.clone()),
        ("description", args.description.clone()),
        ("orgName", args.name.clone()),
        ("release", args.release.map(|r| r.as_str().to_string())),
        ("sourceOrg", args.source_org.clone()),
        ("adminEmail", args.admin_email.clone()),
        ("snapshot", args.snapshot.clone()),
    ];

    for (key, value) in overrides {
        if let Some(v) = value {
            org_config.insert(key.to_string(), JsonValue::String(v));
        }
    }

    let wait = if args.is_async {
        Duration::ZERO
    } else {
        Duration::from_secs(args.wait * 60)
    };

    CreateRequest {
        org_config,
        duration_days: args.duration_days,
        no_ancestors: args.no_ancestors,
        no_namespace: args.no_namespace,
        wait,
        alias: args.alias.clone(),
        set_default: args.set_default,
        tracks_source: args.track_source,
        client_id: args.client_id.clone(),
        client_secret,
    }
}
