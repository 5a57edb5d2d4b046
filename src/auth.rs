// src/auth.rs

use anyhow::Result;

use crate::config::HubEntry;
use crate::util::hub_token_env_var;

/// Resolve the access token for a hub (env preferred; yaml allowed).
pub fn resolve_access_token(alias: &str, entry: &HubEntry) -> Result<String> {
    let var = hub_token_env_var(alias);

    if let Ok(v) = std::env::var(&var) {
        if !v.trim().is_empty() {
            return Ok(v);
        }
    }

    match entry.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(t) => {
            tracing::warn!(
                hub = alias,
                "using access token from config.yaml; prefer the {} environment variable",
                var
            );
            Ok(t.to_string())
        }
        None => anyhow::bail!(
            "No access token available for dev hub '{alias}'.\n\
            \n\
            Provide it using ONE of the following:\n\
            • Environment variable (recommended):\n\
                export {var}=...\n\
            • config.yaml (local only):\n\
                hubs:\n\
                    {alias}:\n\
                        access_token: ...\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_config_token() {
        let entry = HubEntry {
            access_token: Some("from-yaml".into()),
            ..Default::default()
        };
        let token = resolve_access_token("auth-test-yaml-only", &entry).unwrap();
        assert_eq!(token, "from-yaml");
    }

    #[test]
    fn env_token_wins() {
        std::env::set_var("SCRATCHORG_HUB_TOKEN_AUTH_TEST_ENV", "from-env");
        let entry = HubEntry {
            access_token: Some("from-yaml".into()),
            ..Default::default()
        };
        let token = resolve_access_token("auth-test-env", &entry).unwrap();
        assert_eq!(token, "from-env");
    }

    #[test]
    fn missing_token_explains_env_var() {
        let err = resolve_access_token("auth-test-none", &HubEntry::default()).unwrap_err();
        assert!(err
            .to_string()
            .contains("SCRATCHORG_HUB_TOKEN_AUTH_TEST_NONE"));
    }
}
