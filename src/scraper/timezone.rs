use reqwest::Client;
use serde_json::Value;

use super::{read_json, FetchError};

/// ipgeolocation.io timezone lookup, forwarded as-is
pub async fn lookup(
    http: &Client,
    base: &str,
    api_key: &str,
    location: &str,
) -> Result<Value, FetchError> {
    let url = format!("{}/v2/timezone", base);
    tracing::debug!("Fetching timezone for '{}'", location);

    let response = http
        .get(&url)
        .query(&[("apiKey", api_key), ("location", location)])
        .send()
        .await?;

    read_json(response).await
}
