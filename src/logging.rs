// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the tracing subscriber.
///
/// Filter precedence:
/// - `SCRATCHORG_LOG`
/// - `RUST_LOG`
/// - `logging.level` from config.yaml
///
/// Logs always go to stderr so `--json` output on stdout stays parseable.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_env("SCRATCHORG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
