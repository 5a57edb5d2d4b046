use anyhow::Result;
use async_trait::async_trait;

pub mod client;
pub mod limits;
pub mod rest;
pub mod selector;

pub use limits::{check_capacity, has_capacity, ApiLimit};
pub use selector::{select_hub, ProbePolicy};

/// An authenticated connection to one dev hub.
#[async_trait]
pub trait DevHub: Send + Sync {
    /// Identifier the hub was selected by.
    fn id(&self) -> &str;

    /// Base URL of the hub, if its metadata carries one.
    fn instance_url(&self) -> Option<&str>;

    /// Fetch the hub's limits. Never cached.
    async fn fetch_limits(&self) -> Result<Vec<ApiLimit>>;
}

/// Turns a candidate identifier into a connected hub.
#[async_trait]
pub trait HubConnector: Send + Sync {
    type Hub: DevHub;

    async fn connect(&self, id: &str) -> Result<Self::Hub>;
}
