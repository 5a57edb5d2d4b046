// src/messages.rs

//! User-facing text.
//!
//! All strings the CLI prints live in one table, built once in `main.rs`
//! and handed to the runner. Templates use positional placeholders:
//! `{0}`, `{1}`, ...

use std::collections::HashMap;

const TABLE: &[(&str, &str)] = &[
    ("create.resolving_hub", "Finding a dev hub with scratch org capacity"),
    ("create.hub_selected", "Using dev hub {0}"),
    ("create.prompt_secret", "OAuth client secret for {0}"),
    ("create.spinner_start", "Creating scratch org"),
    ("create.status", "Creating scratch org ({0})"),
    ("create.success", "Your scratch org is ready: {0} ({1})"),
    ("create.failed", "Scratch org creation failed"),
    (
        "create.queued",
        "Request to create scratch org is queued.\nRun \"{0} resume --job-id {1}\" to resume waiting, or check its status later.",
    ),
    (
        "create.timeout",
        "The scratch org did not finish within the wait time; it is still being created.\nRun \"{0} resume --job-id {1}\" to keep waiting.",
    ),
    (
        "create.timeout_untracked",
        "The scratch org did not finish within the wait time and the hub reported no job id to resume.",
    ),
    ("create.warning", "Warning: {0}"),
    ("resume.spinner_start", "Resuming scratch org job {0}"),
    ("limits.header", "Limits for dev hub {0}:"),
    ("limits.capacity_ok", "{0} can create scratch orgs"),
    ("limits.capacity_none", "{0} has no scratch org capacity left"),
];

/// Key → template lookup.
#[derive(Debug, Clone)]
pub struct Messages {
    templates: HashMap<&'static str, &'static str>,
}

impl Messages {
    /// Build the message table. Call once per process.
    pub fn load() -> Self {
        Self {
            templates: TABLE.iter().copied().collect(),
        }
    }

    /// Render `key` with positional arguments.
    ///
    /// Unknown keys render as the key itself.
    pub fn get(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.templates.get(key) else {
            tracing::debug!(key, "missing message key");
            return key.to_string();
        };

        let mut out = template.to_string();
        for (idx, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{}}}", idx), arg);
        }
        out
    }
}
