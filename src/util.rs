// src/util.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Read a UTF-8 file into a String with a clear error message.
///
/// This is mainly used for:
/// - the scratch org definition file
/// - config.yaml and state.yaml
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Ensure a directory exists (create it if missing).
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {:?}", path))
}

/// Root directory for config.yaml and state.yaml.
///
/// `SCRATCHORG_HOME` wins; otherwise `~/.scratchorg`.
pub fn scratchorg_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SCRATCHORG_HOME") {
        return Ok(PathBuf::from(dir));
    }

    let home = dirs::home_dir().context("Unable to determine home directory")?;
    Ok(home.join(".scratchorg"))
}

/// Name the user invoked us by, for hints like `scratchorg resume ...`.
pub fn bin_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Environment variable name holding the access token for a hub alias.
///
/// Example:
/// alias = my-hub.eu → SCRATCHORG_HUB_TOKEN_MY_HUB_EU
pub fn hub_token_env_var(alias: &str) -> String {
    let suffix: String = alias
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("SCRATCHORG_HUB_TOKEN_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_env_var_normalises_alias() {
        assert_eq!(hub_token_env_var("my-hub.eu"), "SCRATCHORG_HUB_TOKEN_MY_HUB_EU");
        assert_eq!(hub_token_env_var("Hub1"), "SCRATCHORG_HUB_TOKEN_HUB1");
    }

    #[test]
    fn read_to_string_names_missing_file() {
        let err = read_to_string(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
