use crate::domain::ports::ProbeStore;
use crate::infrastructure::azure_table::auth::{
    API_VERSION, authorization_header, format_request_date,
};
use crate::infrastructure::azure_table::connection_string::StorageAccount;
use crate::infrastructure::http_client_factory::build_url_with_query;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const ODATA_JSON: &str = "application/json;odata=nometadata";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-nextpartitionkey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-nextrowkey";

#[derive(Deserialize)]
struct QueryPage {
    #[serde(default)]
    value: Vec<serde_json::Value>,
}

/// Table service store speaking the Azure Table REST protocol
pub struct AzureTableStore {
    client: Client,
    account: StorageAccount,
    table_name: String,
}

impl AzureTableStore {
    pub fn new(client: Client, account: StorageAccount, table_name: impl Into<String>) -> Self {
        Self {
            client,
            account,
            table_name: table_name.into(),
        }
    }

    pub fn from_connection_string(
        client: Client,
        connection_string: &str,
        table_name: impl Into<String>,
    ) -> Result<Self> {
        let account = StorageAccount::parse(connection_string)
            .context("Failed to parse storage connection string")?;
        Ok(Self::new(client, account, table_name))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Attach date, version and SharedKeyLite authorization headers
    fn signed(&self, builder: RequestBuilder, url: &Url) -> RequestBuilder {
        let date = format_request_date(Utc::now());
        let authorization = authorization_header(
            &self.account.account_name,
            &self.account.account_key,
            &date,
            url,
        );

        builder
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, ODATA_JSON)
    }

    /// URL of one page of the equality query
    fn query_url(
        &self,
        partition_key: &str,
        row_key: &str,
        continuation: Option<&(String, Option<String>)>,
    ) -> Result<Url> {
        let mut params = vec![
            ("$filter", equality_filter(partition_key, row_key)),
            ("$select", "PartitionKey,RowKey".to_string()),
        ];
        if let Some((next_partition, next_row)) = continuation {
            params.push(("NextPartitionKey", next_partition.clone()));
            if let Some(next_row) = next_row {
                params.push(("NextRowKey", next_row.clone()));
            }
        }

        let base = self.account.resource_url(&format!("{}()", self.table_name));
        Url::parse(&build_url_with_query(&base, &params)).context("Failed to build query URL")
    }
}

#[async_trait]
impl ProbeStore for AzureTableStore {
    async fn ensure_table(&self) -> Result<()> {
        let url = Url::parse(&self.account.resource_url("Tables"))
            .context("Failed to build table creation URL")?;

        let response = self
            .signed(self.client.post(url.clone()), &url)
            .header("Prefer", "return-no-content")
            .json(&serde_json::json!({ "TableName": self.table_name }))
            .send()
            .await
            .with_context(|| format!("Failed to reach table service at {}", url))?;

        let status = response.status();
        if status.is_success() {
            info!("Created table {}", self.table_name);
            Ok(())
        } else if status == StatusCode::CONFLICT {
            debug!("Table {} already exists", self.table_name);
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "Failed to create table {}: {} {}",
                self.table_name,
                status,
                body
            )
        }
    }

    async fn count_matches(&self, partition_key: &str, row_key: &str) -> Result<usize> {
        let mut total = 0;
        let mut continuation: Option<(String, Option<String>)> = None;

        loop {
            let url = self.query_url(partition_key, row_key, continuation.as_ref())?;

            let response = self
                .signed(self.client.get(url.clone()), &url)
                .send()
                .await
                .with_context(|| format!("Failed to query table {}", self.table_name))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                bail!(
                    "Query against table {} failed: {} {}",
                    self.table_name,
                    status,
                    body
                );
            }

            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            let next_partition = header(NEXT_PARTITION_KEY);
            let next_row = header(NEXT_ROW_KEY);

            let page: QueryPage = response
                .json()
                .await
                .context("Failed to decode table query response")?;
            total += page.value.len();

            match next_partition {
                Some(next_partition) => continuation = Some((next_partition, next_row)),
                None => break,
            }
        }

        Ok(total)
    }
}

/// `PartitionKey eq '..' and RowKey eq '..'` with OData string quoting
pub fn equality_filter(partition_key: &str, row_key: &str) -> String {
    format!(
        "PartitionKey eq {} and RowKey eq {}",
        odata_string(partition_key),
        odata_string(row_key)
    )
}

fn odata_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AzureTableStore {
        AzureTableStore::from_connection_string(
            Client::new(),
            "AccountName=acct;AccountKey=a2V5LWJ5dGVz",
            "flatevents",
        )
        .unwrap()
    }

    #[test]
    fn test_equality_filter() {
        assert_eq!(
            equality_filter("WithRegard/HealthCheck", "healthcheckX1X"),
            "PartitionKey eq 'WithRegard/HealthCheck' and RowKey eq 'healthcheckX1X'"
        );
    }

    #[test]
    fn test_equality_filter_escapes_quotes() {
        assert_eq!(
            equality_filter("o'brien", "x"),
            "PartitionKey eq 'o''brien' and RowKey eq 'x'"
        );
    }

    #[test]
    fn test_query_url_first_page() {
        let url = store().query_url("pk", "rk", None).unwrap();
        assert_eq!(url.path(), "/flatevents()");
        assert_eq!(
            url.query(),
            Some(
                "%24filter=PartitionKey%20eq%20%27pk%27%20and%20RowKey%20eq%20%27rk%27&%24select=PartitionKey%2CRowKey"
            )
        );
    }

    #[test]
    fn test_query_url_with_continuation() {
        let continuation = ("1!8!cGs-".to_string(), Some("1!8!cms-".to_string()));
        let url = store()
            .query_url("pk", "rk", Some(&continuation))
            .unwrap();

        let query = url.query().unwrap();
        assert!(query.contains("NextPartitionKey=1%218%21cGs-"));
        assert!(query.contains("NextRowKey=1%218%21cms-"));
    }

    #[test]
    fn test_invalid_connection_string_is_rejected() {
        let result =
            AzureTableStore::from_connection_string(Client::new(), "AccountName=acct", "t");
        assert!(result.is_err());
    }
}
