// src/hub/rest.rs

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::client::{HubClient, DEFAULT_API_VERSION};
use super::limits::flatten_limits;
use super::{ApiLimit, DevHub, HubConnector};
use crate::auth::resolve_access_token;
use crate::config::Config;

/// Dev hub reached over the REST API.
#[derive(Debug, Clone)]
pub struct RestHub {
    id: String,
    alias: String,
    username: Option<String>,
    instance_url: Option<String>,
    client: Option<HubClient>,
}

impl RestHub {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// REST client, present only when the hub has an instance URL.
    pub fn client(&self) -> Option<&HubClient> {
        self.client.as_ref()
    }
}

#[async_trait]
impl DevHub for RestHub {
    fn id(&self) -> &str {
        &self.id
    }

    fn instance_url(&self) -> Option<&str> {
        self.instance_url.as_deref()
    }

    async fn fetch_limits(&self) -> Result<Vec<ApiLimit>> {
        let Some(client) = &self.client else {
            bail!("Dev hub '{}' has no instance URL", self.id);
        };

        let raw = client.get_json("limits").await?;
        flatten_limits(&raw)
    }
}

/// Connects to hubs declared in config.yaml.
pub struct RestHubConnector<'a> {
    config: &'a Config,
    config_path: String,
    api_version: Option<String>,
}

impl<'a> RestHubConnector<'a> {
    /// `api_version` overrides each hub's configured version.
    pub fn new(config: &'a Config, config_path: String, api_version: Option<String>) -> Self {
        Self {
            config,
            config_path,
            api_version,
        }
    }
}

#[async_trait]
impl<'a> HubConnector for RestHubConnector<'a> {
    type Hub = RestHub;

    async fn connect(&self, id: &str) -> Result<RestHub> {
        let Some((alias, entry)) = self.config.find_hub(id) else {
            bail!(
                "Unknown dev hub '{}'. Declare it under `hubs:` in {}",
                id,
                self.config_path
            );
        };

        let token = resolve_access_token(alias, entry)?;

        let api_version = self
            .api_version
            .as_deref()
            .or(entry.api_version.as_deref())
            .unwrap_or(DEFAULT_API_VERSION);

        let instance_url = entry
            .instance_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        let client = match &instance_url {
            Some(url) => Some(HubClient::new(url, api_version, &token)?),
            None => None,
        };

        tracing::debug!(hub = id, alias, api_version, "connected to dev hub");

        Ok(RestHub {
            id: id.to_string(),
            alias: alias.to_string(),
            username: entry.username.clone(),
            instance_url,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CreateError;
    use crate::hub::{check_capacity, select_hub, ProbePolicy};
    use crate::testing::{FakeServer, HubState};

    fn config_for(server_url: &str) -> Config {
        Config::parse(&format!(
            r#"
hubs:
  live:
    username: admin@live.example
    instance_url: {server_url}
    access_token: test-token
  no-url:
    access_token: test-token
"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_limits_over_http() {
        let server = FakeServer::start(HubState::with_limits(2, 5)).await;
        let cfg = config_for(&server.url());
        let connector = RestHubConnector::new(&cfg, "config.yaml".into(), None);

        let hub = connector.connect("admin@live.example").await.unwrap();
        assert_eq!(hub.alias(), "live");

        let limits = hub.fetch_limits().await.unwrap();
        assert!(limits
            .iter()
            .any(|l| l.name == "ActiveScratchOrgs" && l.remaining == 2));
        assert!(check_capacity(&hub).await.unwrap());
    }

    #[tokio::test]
    async fn rejected_token_is_an_error() {
        let server = FakeServer::start(HubState::with_limits(2, 5)).await;
        let cfg = Config::parse(&format!(
            "hubs:\n  live:\n    instance_url: {}\n    access_token: wrong\n",
            server.url()
        ))
        .unwrap();
        let connector = RestHubConnector::new(&cfg, "config.yaml".into(), None);

        let hub = connector.connect("live").await.unwrap();
        let err = hub.fetch_limits().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn unknown_hub_names_config_path() {
        let cfg = Config::default();
        let connector = RestHubConnector::new(&cfg, "/tmp/cfg.yaml".into(), None);
        let err = connector.connect("ghost").await.unwrap_err();
        assert!(err.to_string().contains("/tmp/cfg.yaml"));
    }

    #[tokio::test]
    async fn hub_without_instance_url_connects_but_cannot_query() {
        let cfg = config_for("http://127.0.0.1:9");
        let connector = RestHubConnector::new(&cfg, "config.yaml".into(), None);

        let hub = connector.connect("no-url").await.unwrap();
        assert!(hub.instance_url().is_none());
        assert!(hub.fetch_limits().await.is_err());
    }

    #[tokio::test]
    async fn selection_reports_missing_instance_url() {
        let cfg = config_for("http://127.0.0.1:9");
        let connector = RestHubConnector::new(&cfg, "config.yaml".into(), None);

        let err = select_hub(&connector, &["no-url".to_string()], ProbePolicy::FailFast)
            .await
            .unwrap_err();

        assert!(matches!(err, CreateError::MissingInstanceUrl { ref hub } if hub == "no-url"));
        assert_eq!(err.exit_code(), 1);
    }
}
