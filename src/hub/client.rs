// src/hub/client.rs

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{ProvisionError, ProvisionErrorKind};

pub const DEFAULT_API_VERSION: &str = "61.0";

/// Thin REST client bound to one hub's instance URL and token.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    headers: HeaderMap,
    base_url: String,
    api_version: String,
}

impl HubClient {
    pub fn new(instance_url: &str, api_version: &str, token: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            headers: hub_headers(token)?,
            base_url: instance_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    /// `{instance}/services/data/v{api}/{path}`
    pub fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.base_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    pub async fn get_json(&self, path: &str) -> Result<JsonValue> {
        let url = self.data_url(path);
        let resp = self
            .http
            .get(&url)
            .headers(self.headers.clone())
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .with_context(|| format!("Failed to call GET {}", url))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            bail!("GET {} failed: {} {}", path, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("GET {} returned invalid JSON", path))
    }

    /// GET used by the provisioning delegate; failures carry an error kind.
    pub async fn get_record(&self, path: &str) -> Result<JsonValue, ProvisionError> {
        let resp = self
            .http
            .get(self.data_url(path))
            .headers(self.headers.clone())
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        read_json(resp, "GET", path).await
    }

    pub async fn post_record(
        &self,
        path: &str,
        payload: &JsonValue,
    ) -> Result<JsonValue, ProvisionError> {
        let resp = self
            .http
            .post(self.data_url(path))
            .headers(self.headers.clone())
            .json(payload)
            .timeout(Duration::from_secs(60))
            .send()
            .await?;

        read_json(resp, "POST", path).await
    }
}

async fn read_json(
    resp: reqwest::Response,
    method: &str,
    path: &str,
) -> Result<JsonValue, ProvisionError> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    if status.is_client_error() {
        return Err(ProvisionError::new(
            ProvisionErrorKind::Rejected,
            format!("{} {} failed: {} {}", method, path, status, text),
        ));
    }
    if !status.is_success() {
        return Err(ProvisionError::new(
            ProvisionErrorKind::Transport,
            format!("{} {} failed: {} {}", method, path, status, text),
        ));
    }

    serde_json::from_str(&text).map_err(|e| {
        ProvisionError::new(
            ProvisionErrorKind::InvalidResponse,
            format!("{} {} returned invalid JSON: {}", method, path, e),
        )
    })
}

fn hub_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let auth_val = format!("Bearer {}", token);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&auth_val).context("Invalid access token for Authorization header")?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}
