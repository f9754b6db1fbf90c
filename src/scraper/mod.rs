pub mod github;
pub mod osu;
pub mod spotify;
pub mod timezone;
pub mod titanic;
pub mod weather;

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::auth::AuthError;

const USER_AGENT: &str = concat!("portfolio-api/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by every upstream module.
/// Idle connections per host are kept low to save memory.
pub fn build_http_client() -> anyhow::Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(2)
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
        .context("Failed to create HTTP client")
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl FetchError {
    /// Upstream status if the request reached the server but was refused
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Rounds to the nearest integer with halves going up, so -2.5 becomes -2
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Fails with `FetchError::Status` unless the response is 2xx
pub async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // Path only, query strings may carry API keys
    let url = format!(
        "{}{}",
        response.url().host_str().unwrap_or_default(),
        response.url().path()
    );
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        "Upstream {} returned {}: {}",
        url,
        status.as_u16(),
        body.chars().take(300).collect::<String>()
    );
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Checks the status then decodes the JSON body
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        FetchError::Decode(format!(
            "{} - Response: {}",
            e,
            text.chars().take(300).collect::<String>()
        ))
    })
}
