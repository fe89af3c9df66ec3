//! Configuration for the health-check probe.
//!
//! Loaded once at startup from environment variables (a `.env` file is read by
//! the binary first) and then passed explicitly to the prober. The six
//! connection settings are required; tuning lives in [`ProbeSettings`].

mod probe_settings;

pub use probe_settings::ProbeSettings;

use crate::domain::errors::ProbeError;
use std::env;
use url::Url;

pub const ENDPOINT_URL: &str = "EndPointUrl";
pub const STORAGE_TABLE_NAME: &str = "StorageTableName";
pub const POST_PATH: &str = "PostPath";
pub const PARTITION_KEY: &str = "PartitionKey";
pub const STORAGE_CONNECTION_STRING: &str = "StorageConnectionString";
pub const SHARED_SECRET: &str = "HealthCheckSharedSecret";

/// Main probe configuration
#[derive(Clone)]
pub struct Config {
    pub endpoint_url: Url,
    pub post_path: String,
    pub partition_key: String,
    pub storage_connection_string: String,
    pub storage_table_name: String,
    pub shared_secret: String,
    pub probe: ProbeSettings,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("post_path", &self.post_path)
            .field("partition_key", &self.partition_key)
            .field("storage_connection_string", &"<redacted>")
            .field("storage_table_name", &self.storage_table_name)
            .field("shared_secret", &"<redacted>")
            .field("probe", &self.probe)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ProbeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProbeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_raw = required(&lookup, ENDPOINT_URL)?;
        let endpoint_url = Url::parse(&endpoint_raw).map_err(|e| {
            ProbeError::configuration(format!(
                "{} is not a valid URL ({:?}): {}",
                ENDPOINT_URL, endpoint_raw, e
            ))
        })?;

        Ok(Self {
            endpoint_url,
            storage_table_name: required(&lookup, STORAGE_TABLE_NAME)?,
            post_path: required(&lookup, POST_PATH)?,
            partition_key: required(&lookup, PARTITION_KEY)?,
            storage_connection_string: required(&lookup, STORAGE_CONNECTION_STRING)?,
            shared_secret: required(&lookup, SHARED_SECRET)?,
            probe: ProbeSettings::from_lookup(&lookup)?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ProbeError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ProbeError::configuration(format!(
            "Missing required setting {}",
            key
        ))),
    }
}
