//! SharedKeyLite request signing for the Table service.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

pub const API_VERSION: &str = "2019-02-02";

/// RFC 1123 date as the service expects in `x-ms-date`
pub fn format_request_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Canonicalized resource: `/{account}{path}`, query string excluded
pub fn canonicalized_resource(account_name: &str, url: &Url) -> String {
    format!("/{}{}", account_name, url.path())
}

/// Build the `Authorization` header value for a request.
pub fn authorization_header(
    account_name: &str,
    account_key: &[u8],
    request_date: &str,
    url: &Url,
) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let string_to_sign = format!(
        "{}\n{}",
        request_date,
        canonicalized_resource(account_name, url)
    );

    let mut mac =
        HmacSha256::new_from_slice(account_key).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    format!("SharedKeyLite {}:{}", account_name, signature)
}
