//! Bearer tokens for upstream APIs
//!
//! A `CredentialCache` owns one cached token. It hands back the stored token
//! while it is still valid and asks its `TokenIssuer` for a new one once the
//! recorded expiry has been reached. The expiry is pulled forward by a safety
//! margin so a token is never used right up to its advertised lifetime.

pub mod osu;
pub mod spotify;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

pub use osu::OsuClientCredentialsIssuer;
pub use spotify::SpotifyRefreshIssuer;
pub use store::{CredentialStore, MemoryStore, SqliteStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
    #[error("credential store error: {0:#}")]
    Store(anyhow::Error),
}

/// The cached token together with the moment it stops being usable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCredential {
    pub token: String,
    pub expires_at_ms: i64,
}

impl CachedCredential {
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// A freshly issued token as reported by the upstream token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    fn name(&self) -> &str;

    async fn issue(&self) -> Result<IssuedToken, AuthError>;
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Raw body of an OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Turns a token endpoint response into an `IssuedToken`
pub(crate) async fn read_token_response(
    response: reqwest::Response,
) -> Result<IssuedToken, AuthError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(AuthError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::InvalidResponse(format!("{} - Response: {}", e, body)))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidResponse(format!("missing access_token: {}", body)))?;
    let expires_in = parsed
        .expires_in
        .ok_or_else(|| AuthError::InvalidResponse(format!("missing expires_in: {}", body)))?;
    if expires_in <= 0 {
        return Err(AuthError::InvalidResponse(format!(
            "non-positive expires_in: {}",
            body
        )));
    }

    Ok(IssuedToken {
        access_token,
        expires_in,
    })
}

pub struct CredentialCache {
    key: String,
    store: Arc<dyn CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    safety_margin_secs: i64,
    refresh: Mutex<()>,
}

impl CredentialCache {
    pub fn new(
        key: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        issuer: Arc<dyn TokenIssuer>,
        safety_margin_secs: i64,
    ) -> Self {
        Self {
            key: key.into(),
            store,
            issuer,
            clock: Arc::new(SystemClock),
            safety_margin_secs,
            refresh: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a credential that is valid right now, refreshing it if needed
    pub async fn valid_credential(&self) -> Result<CachedCredential, AuthError> {
        if let Some(credential) = self.cached().await? {
            if credential.is_valid_at(self.clock.now_ms()) {
                return Ok(credential);
            }
        }

        let _guard = self.refresh.lock().await;

        // Someone else may have refreshed while we waited for the guard
        if let Some(credential) = self.cached().await? {
            if credential.is_valid_at(self.clock.now_ms()) {
                return Ok(credential);
            }
        }

        tracing::debug!("Refreshing {} token", self.issuer.name());
        let issued = self.issuer.issue().await?;

        let now = self.clock.now_ms();
        let lifetime_ms = issued
            .expires_in
            .saturating_sub(self.safety_margin_secs)
            .saturating_mul(1000);
        let credential = CachedCredential {
            token: issued.access_token,
            expires_at_ms: now.saturating_add(lifetime_ms),
        };

        let serialized = serde_json::to_string(&credential)
            .map_err(|e| AuthError::Store(anyhow::Error::new(e)))?;
        self.store
            .put(&self.key, serialized)
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(
            "Cached new {} token, valid for {}s",
            self.issuer.name(),
            lifetime_ms / 1000
        );

        Ok(credential)
    }

    /// Shorthand for the bearer token string
    pub async fn bearer(&self) -> Result<String, AuthError> {
        Ok(self.valid_credential().await?.token)
    }

    async fn cached(&self) -> Result<Option<CachedCredential>, AuthError> {
        let raw = self.store.get(&self.key).await.map_err(AuthError::Store)?;

        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached credential '{}': {}", self.key, e);
                None
            }
        }))
    }
}
