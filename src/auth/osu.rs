use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{read_token_response, AuthError, IssuedToken, TokenIssuer};

/// osu! client-credentials grant, scoped to public data
pub struct OsuClientCredentialsIssuer {
    client: Client,
    token_url: String,
    client_id: u64,
    client_secret: String,
}

impl OsuClientCredentialsIssuer {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Self, AuthError> {
        let client_id = client_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::Configuration("Missing OSU_CLIENT_ID".to_string()))?;
        // The token endpoint only accepts a numeric id
        let client_id: u64 = client_id.parse().map_err(|_| {
            AuthError::Configuration(format!("OSU_CLIENT_ID must be numeric, got '{}'", client_id))
        })?;
        let client_secret = client_secret
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::Configuration("Missing OSU_CLIENT_SECRET".to_string()))?;

        Ok(Self {
            client,
            token_url: token_url.into(),
            client_id,
            client_secret: client_secret.to_string(),
        })
    }
}

#[async_trait]
impl TokenIssuer for OsuClientCredentialsIssuer {
    fn name(&self) -> &str {
        "osu"
    }

    async fn issue(&self) -> Result<IssuedToken, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "grant_type": "client_credentials",
                "scope": "public"
            }))
            .send()
            .await?;

        let result = read_token_response(response).await;
        if let Err(e) = &result {
            tracing::error!("osu! token request failed: {}", e);
        }
        result
    }
}
