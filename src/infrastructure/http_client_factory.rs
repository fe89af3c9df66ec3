use crate::config::ProbeSettings;
use anyhow::{Context, Result};
use reqwest::Client;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates the HTTP client shared by the ingestion and table clients.
    ///
    /// No retry middleware: a transport failure must surface to the prober
    /// immediately instead of being retried behind its back.
    pub fn create_client(settings: &ProbeSettings) -> Result<Client> {
        Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(settings.http_timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(concat!("regard-healthcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")
    }
}

/// Helper function to build a URL with query parameters.
///
/// Values are percent-encoded (spaces become `%20`, never `+`) so OData
/// filter expressions reach the table service intact.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string: String = params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding_encode(k.as_ref()),
                urlencoding_encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    if base_url.contains('?') {
        format!("{}&{}", base_url, query_string)
    } else {
        format!("{}?{}", base_url, query_string)
    }
}

fn urlencoding_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
