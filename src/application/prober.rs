//! End-to-end pipeline probe.
//!
//! Posts a signed, uniquely keyed event to the ingestion endpoint and waits
//! for the pipeline to write it into the events table:
//!
//! `INIT -> BASELINE_QUERY -> SUBMIT -> POLLING -> (SESSION_EVENT) -> DONE`
//!
//! Any failure ends the run with a [`ProbeError`] tagged with the stage it
//! happened in. The poll loop is bounded by attempt count and elapsed time.

use crate::config::{Config, ProbeSettings};
use crate::domain::errors::{ProbeError, ProbeStage};
use crate::domain::events::{SignedPayload, TEST_SESSION_EVENT_PATH, TestSessionEvent};
use crate::domain::identifier::ProbeIdentifier;
use crate::domain::ports::{EventIngestion, IngestionResponse, ProbeStore};
use crate::infrastructure::{AzureTableStore, HttpClientFactory, HttpIngestionClient};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Outcome of a successful probe run
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub rowkey: ProbeIdentifier,
    pub baseline_matches: usize,
    pub ingestion_response: IngestionResponse,
    pub poll_attempts: u32,
    pub matches: usize,
    pub elapsed: Duration,
    pub session_event_response: Option<IngestionResponse>,
}

pub struct Prober {
    ingestion: Arc<dyn EventIngestion>,
    store: Arc<dyn ProbeStore>,
    post_path: String,
    partition_key: String,
    shared_secret: String,
    settings: ProbeSettings,
}

impl Prober {
    pub fn new(
        config: &Config,
        ingestion: Arc<dyn EventIngestion>,
        store: Arc<dyn ProbeStore>,
    ) -> Self {
        Self {
            ingestion,
            store,
            post_path: config.post_path.clone(),
            partition_key: config.partition_key.clone(),
            shared_secret: config.shared_secret.clone(),
            settings: config.probe.clone(),
        }
    }

    /// Wire the prober to the real ingestion endpoint and table service
    pub fn build(config: &Config) -> Result<Self, ProbeError> {
        let client = HttpClientFactory::create_client(&config.probe)
            .map_err(|e| ProbeError::transport(ProbeStage::Init, e))?;

        let ingestion = HttpIngestionClient::new(client.clone(), config.endpoint_url.clone());
        let store = AzureTableStore::from_connection_string(
            client,
            &config.storage_connection_string,
            config.storage_table_name.clone(),
        )
        .map_err(|e| ProbeError::configuration(format!("{:#}", e)))?;

        Ok(Self::new(config, Arc::new(ingestion), Arc::new(store)))
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Fresh identifier for this run's probe event
    pub fn generate_identifier() -> ProbeIdentifier {
        ProbeIdentifier::generate()
    }

    /// Number of rows in the configured partition keyed by `rowkey`
    pub async fn count_matches(&self, rowkey: &ProbeIdentifier) -> Result<usize> {
        self.store
            .count_matches(&self.partition_key, rowkey.as_str())
            .await
    }

    /// POST `payload` as JSON to `path` below the endpoint
    pub async fn submit_event<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<IngestionResponse> {
        let body = serde_json::to_value(payload).context("Failed to serialize event")?;
        self.ingestion.post_json(path, &body).await
    }

    /// Run the full probe sequence once.
    pub async fn run(&self) -> Result<ProbeReport, ProbeError> {
        let started = Instant::now();

        enter(ProbeStage::Init);
        info!("HealthCheck: attaching to the storage account");
        self.store
            .ensure_table()
            .await
            .map_err(|e| ProbeError::store(ProbeStage::Init, e))?;

        let rowkey = Self::generate_identifier();
        enter(ProbeStage::BaselineQuery);
        let baseline_matches = self
            .count_matches(&rowkey)
            .await
            .map_err(|e| ProbeError::store(ProbeStage::BaselineQuery, e))?;
        info!("HealthCheck: found {} matches initially", baseline_matches);

        enter(ProbeStage::Submit);
        let payload = SignedPayload::new(rowkey.clone(), &self.shared_secret);
        info!("HealthCheck: Will generate rowkey {}", rowkey);
        info!("HealthCheck: Sending request");
        let ingestion_response = self
            .submit_event(&self.post_path, &payload)
            .await
            .map_err(|e| ProbeError::transport(ProbeStage::Submit, e))?;
        info!("HealthCheck: Response {}", ingestion_response);
        if !ingestion_response.is_success() {
            warn!(
                "HealthCheck: ingestion answered {}; polling anyway",
                ingestion_response
            );
        }

        enter(ProbeStage::Polling);
        let (poll_attempts, matches) = self.wait_for_event(&rowkey).await?;
        info!("HealthCheck: request was processed");

        let session_event_response = if self.settings.send_session_event {
            enter(ProbeStage::SessionEvent);
            self.send_session_event(&rowkey).await
        } else {
            None
        };

        enter(ProbeStage::Done);
        Ok(ProbeReport {
            rowkey,
            baseline_matches,
            ingestion_response,
            poll_attempts,
            matches,
            elapsed: started.elapsed(),
            session_event_response,
        })
    }

    /// Poll the store until the row shows up or a bound is hit.
    ///
    /// Returns the number of queries issued and the final match count.
    async fn wait_for_event(&self, rowkey: &ProbeIdentifier) -> Result<(u32, usize), ProbeError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            info!("HealthCheck: querying for event");

            let count = self
                .count_matches(rowkey)
                .await
                .map_err(|e| ProbeError::store(ProbeStage::Polling, e))?;
            info!("HealthCheck: Found {} results", count);

            if count >= 1 {
                return Ok((attempts, count));
            }

            let elapsed = started.elapsed();
            if attempts >= self.settings.max_attempts || elapsed >= self.settings.max_duration {
                return Err(ProbeError::TimedOut {
                    rowkey: rowkey.to_string(),
                    attempts,
                    elapsed,
                });
            }

            sleep(self.settings.poll_interval).await;
        }
    }

    /// Record a synthetic session start for the test user.
    ///
    /// Failures are logged and swallowed: the pipeline has already been
    /// proven healthy by the time this runs.
    async fn send_session_event(&self, rowkey: &ProbeIdentifier) -> Option<IngestionResponse> {
        let event = TestSessionEvent::new(rowkey.clone());
        debug!("HealthCheck: sending session event {}", event.session_id);

        match self.submit_event(TEST_SESSION_EVENT_PATH, &event).await {
            Ok(response) => {
                info!("HealthCheck: Session event response {}", response);
                Some(response)
            }
            Err(e) => {
                warn!("HealthCheck: failed to send session event: {:#}", e);
                None
            }
        }
    }
}

fn enter(stage: ProbeStage) {
    debug!("HealthCheck: entering {}", stage);
}
