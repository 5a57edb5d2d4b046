// src/sinks/spinner.rs

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::messages::Messages;
use crate::provision::{EventSink, ProvisionEvent, ProvisionEventKind};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Renders the last known provisioning status on an interactive spinner.
///
/// Single writer (`emit`), single reader (the bar), so no locking.
pub struct SpinnerSink {
    bar: ProgressBar,
    messages: Messages,
    last_status: String,
}

impl SpinnerSink {
    /// Start a spinner on stderr. A hidden bar is used when `quiet`.
    pub fn start(messages: &Messages, initial: String, quiet: bool) -> Result<Self> {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .tick_strings(SPINNER_FRAMES)
                    .template("{spinner:.cyan} {msg}")?,
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        };

        bar.set_message(initial);

        Ok(Self {
            bar,
            messages: messages.clone(),
            last_status: String::new(),
        })
    }

    pub fn last_status(&self) -> &str {
        &self.last_status
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for SpinnerSink {
    fn emit(&mut self, event: ProvisionEvent) {
        let status = match event.kind {
            ProvisionEventKind::Submitted => format!("submitted {}", event.job_id),
            ProvisionEventKind::StatusChanged(s) => s,
            ProvisionEventKind::Completed => "done".to_string(),
        };

        tracing::debug!(job_id = %event.job_id, status = %status, "provisioning progress");

        self.last_status = status;
        self.bar
            .set_message(self.messages.get("create.status", &[self.last_status.as_str()]));
    }
}
