//! Tracking endpoint client.
//!
//! Posts JSON events to the ingestion service. Any HTTP status counts as a
//! delivered request; only failing to get a response is an error.

use crate::domain::ports::{EventIngestion, IngestionResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

pub struct HttpIngestionClient {
    client: Client,
    base_url: Url,
}

impl HttpIngestionClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Resolve `path` against the endpoint base URL
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid path {:?} for endpoint {}", path, self.base_url))
    }
}

#[async_trait]
impl EventIngestion for HttpIngestionClient {
    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<IngestionResponse> {
        let url = self.resolve(path)?;
        let payload = serde_json::to_vec(body).context("Failed to serialize event payload")?;

        debug!("POST {} ({} bytes)", url, payload.len());

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .with_context(|| format!("Failed to send event to {}", url))?;

        let status = response.status();
        Ok(IngestionResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}
