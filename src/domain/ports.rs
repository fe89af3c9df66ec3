use anyhow::Result;
use async_trait::async_trait;

/// Status line returned by the ingestion endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResponse {
    pub status: u16,
    pub reason: String,
}

impl IngestionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Display for IngestionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.reason)
    }
}

/// HTTP endpoint that accepts tracking events.
///
/// Implementations return `Ok` for any HTTP status; only failing to reach the
/// endpoint at all is an error.
#[async_trait]
pub trait EventIngestion: Send + Sync {
    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<IngestionResponse>;
}

/// Key-partitioned table the pipeline writes events into
#[async_trait]
pub trait ProbeStore: Send + Sync {
    /// Create the backing table unless it already exists
    async fn ensure_table(&self) -> Result<()>;

    /// Count rows whose partition key and row key both equal the given values
    async fn count_matches(&self, partition_key: &str, row_key: &str) -> Result<usize>;
}
