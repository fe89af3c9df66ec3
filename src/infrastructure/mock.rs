//! In-memory stand-ins for the ingestion endpoint and the table store.
//!
//! `MockIngestion` can be wired to an `InMemoryProbeStore` so that posting a
//! probe payload writes its row key the way the real pipeline would, with an
//! optional delay (in queries) before the row becomes visible.

use crate::domain::ports::{EventIngestion, IngestionResponse, ProbeStore};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

struct StoredRow {
    partition_key: String,
    row_key: String,
    visible_from_query: u64,
}

/// Table store held in memory
#[derive(Clone)]
pub struct InMemoryProbeStore {
    rows: Arc<RwLock<Vec<StoredRow>>>,
    table_created: Arc<AtomicBool>,
    unavailable: Arc<AtomicBool>,
    queries_unavailable: Arc<AtomicBool>,
    queries: Arc<AtomicU64>,
    create_calls: Arc<AtomicU64>,
    visibility_delay: u64,
}

impl InMemoryProbeStore {
    pub fn new() -> Self {
        Self::with_visibility_delay(0)
    }

    /// Rows written through `insert` only show up after `delay` further queries
    pub fn with_visibility_delay(delay: u64) -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            table_created: Arc::new(AtomicBool::new(false)),
            unavailable: Arc::new(AtomicBool::new(false)),
            queries_unavailable: Arc::new(AtomicBool::new(false)),
            queries: Arc::new(AtomicU64::new(0)),
            create_calls: Arc::new(AtomicU64::new(0)),
            visibility_delay: delay,
        }
    }

    pub async fn insert(&self, partition_key: &str, row_key: &str) {
        let visible_from_query = self.queries.load(Ordering::SeqCst) + self.visibility_delay;
        self.rows.write().await.push(StoredRow {
            partition_key: partition_key.to_string(),
            row_key: row_key.to_string(),
            visible_from_query,
        });
    }

    /// Make every subsequent call fail as if the service could not be reached
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail queries only; table creation keeps working
    pub fn set_queries_unavailable(&self, unavailable: bool) {
        self.queries_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn table_exists(&self) -> bool {
        self.table_created.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryProbeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeStore for InMemoryProbeStore {
    async fn ensure_table(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("Connection refused (in-memory store marked unavailable)");
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.table_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn count_matches(&self, partition_key: &str, row_key: &str) -> Result<usize> {
        if self.unavailable.load(Ordering::SeqCst)
            || self.queries_unavailable.load(Ordering::SeqCst)
        {
            bail!("Connection refused (in-memory store marked unavailable)");
        }
        if !self.table_exists() {
            bail!("TableNotFound: the table specified does not exist");
        }

        let query = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| {
                r.partition_key == partition_key
                    && r.row_key == row_key
                    && r.visible_from_query < query
            })
            .count())
    }
}

/// One request received by `MockIngestion`
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub path: String,
    pub body: serde_json::Value,
}

/// Ingestion endpoint double that records every post
#[derive(Clone)]
pub struct MockIngestion {
    posts: Arc<RwLock<Vec<RecordedPost>>>,
    status: u16,
    failing_paths: Arc<RwLock<Vec<String>>>,
    sink: Option<(InMemoryProbeStore, String, String)>,
}

impl MockIngestion {
    /// Endpoint that answers every request with `status` and stores nothing
    pub fn new(status: u16) -> Self {
        Self {
            posts: Arc::new(RwLock::new(Vec::new())),
            status,
            failing_paths: Arc::new(RwLock::new(Vec::new())),
            sink: None,
        }
    }

    /// Posts to `probe_path` write their `rowkey` into `store` under `partition_key`
    pub fn writing_to(
        mut self,
        store: InMemoryProbeStore,
        probe_path: impl Into<String>,
        partition_key: impl Into<String>,
    ) -> Self {
        self.sink = Some((store, probe_path.into(), partition_key.into()));
        self
    }

    /// Requests to `path` fail at the transport level
    pub async fn fail_path(&self, path: impl Into<String>) {
        self.failing_paths.write().await.push(path.into());
    }

    pub async fn posts(&self) -> Vec<RecordedPost> {
        self.posts.read().await.clone()
    }
}

#[async_trait]
impl EventIngestion for MockIngestion {
    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<IngestionResponse> {
        if self.failing_paths.read().await.iter().any(|p| p == path) {
            return Err(anyhow!("Connection reset while posting to {}", path));
        }

        self.posts.write().await.push(RecordedPost {
            path: path.to_string(),
            body: body.clone(),
        });

        if let Some((store, probe_path, partition_key)) = &self.sink
            && probe_path == path
            && let Some(rowkey) = body.get("rowkey").and_then(|v| v.as_str())
        {
            debug!("MockIngestion: storing {} under {}", rowkey, partition_key);
            store.insert(partition_key, rowkey).await;
        }

        Ok(IngestionResponse {
            status: self.status,
            reason: reqwest::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown")
                .to_string(),
        })
    }
}
