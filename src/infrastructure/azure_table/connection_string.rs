//! Storage account connection strings.
//!
//! Accepts the usual `Key=Value;Key=Value` form:
//! - `DefaultEndpointsProtocol`, `AccountName`, `AccountKey`, `EndpointSuffix`
//! - `TableEndpoint` to override the derived endpoint
//! - `UseDevelopmentStorage=true` for the local emulator

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::collections::HashMap;
use url::Url;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Credentials and table endpoint of a storage account
#[derive(Clone)]
pub struct StorageAccount {
    pub account_name: String,
    pub account_key: Vec<u8>,
    pub table_endpoint: Url,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("account_name", &self.account_name)
            .field("table_endpoint", &self.table_endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl StorageAccount {
    pub fn parse(connection_string: &str) -> Result<Self> {
        let parts = split_pairs(connection_string)?;

        if parts
            .get("UseDevelopmentStorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self {
                account_name: DEV_ACCOUNT_NAME.to_string(),
                account_key: STANDARD.decode(DEV_ACCOUNT_KEY)?,
                table_endpoint: Url::parse(DEV_TABLE_ENDPOINT)?,
            });
        }

        let account_name = parts
            .get("AccountName")
            .context("Connection string is missing AccountName")?
            .to_string();
        let account_key = STANDARD
            .decode(
                parts
                    .get("AccountKey")
                    .context("Connection string is missing AccountKey")?,
            )
            .context("AccountKey is not valid base64")?;

        let table_endpoint = match parts.get("TableEndpoint") {
            Some(endpoint) => {
                Url::parse(endpoint).with_context(|| format!("Invalid TableEndpoint {:?}", endpoint))?
            }
            None => {
                let protocol = parts
                    .get("DefaultEndpointsProtocol")
                    .copied()
                    .unwrap_or("https");
                if protocol != "http" && protocol != "https" {
                    bail!("Unsupported DefaultEndpointsProtocol {:?}", protocol);
                }
                let suffix = parts
                    .get("EndpointSuffix")
                    .copied()
                    .unwrap_or("core.windows.net");
                Url::parse(&format!("{}://{}.table.{}", protocol, account_name, suffix))
                    .context("Failed to derive table endpoint")?
            }
        };

        Ok(Self {
            account_name,
            account_key,
            table_endpoint,
        })
    }

    /// URL of a resource below the table endpoint, e.g. `Tables` or `events()`
    pub fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.table_endpoint.as_str().trim_end_matches('/'),
            resource
        )
    }
}

fn split_pairs(connection_string: &str) -> Result<HashMap<&str, &str>> {
    let mut parts = HashMap::new();
    for segment in connection_string.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            bail!("Malformed connection string segment {:?}", segment);
        };
        parts.insert(key.trim(), value.trim());
    }
    Ok(parts)
}
