use async_trait::async_trait;
use reqwest::Client;

use super::{read_token_response, AuthError, IssuedToken, TokenIssuer};

/// Exchanges the long-lived Spotify refresh token for an access token
pub struct SpotifyRefreshIssuer {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl SpotifyRefreshIssuer {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<Self, AuthError> {
        match (non_empty(client_id), non_empty(client_secret), non_empty(refresh_token)) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Self {
                client,
                token_url: token_url.into(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                refresh_token: refresh_token.to_string(),
            }),
            _ => Err(AuthError::Configuration(
                "Missing Spotify credentials in environment variables".to_string(),
            )),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl TokenIssuer for SpotifyRefreshIssuer {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn issue(&self) -> Result<IssuedToken, AuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        read_token_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{http::HeaderMap, routing::post, Form, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

    async fn token_endpoint(
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        let auth_ok = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Basic Y2xpZW50OnNlY3JldA==");
        let grant_ok = form.get("grant_type").map(String::as_str) == Some("refresh_token")
            && form.get("refresh_token").map(String::as_str) == Some("refresh");

        if auth_ok && grant_ok {
            Json(json!({
                "access_token": "spotify-access",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "user-read-recently-played"
            }))
        } else {
            Json(json!({ "error": "invalid_client" }))
        }
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let result = SpotifyRefreshIssuer::new(
            Client::new(),
            SPOTIFY_TOKEN_URL,
            Some("client"),
            Some("  "),
            Some("refresh"),
        );
        assert!(matches!(result, Err(AuthError::Configuration(_))));

        let result =
            SpotifyRefreshIssuer::new(Client::new(), SPOTIFY_TOKEN_URL, None, None, None);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_issue_sends_refresh_grant_with_basic_auth() {
        let base = spawn_upstream(Router::new().route("/api/token", post(token_endpoint))).await;
        let issuer = SpotifyRefreshIssuer::new(
            Client::new(),
            format!("{}/api/token", base),
            Some("client"),
            Some("secret"),
            Some("refresh"),
        )
        .unwrap();

        let token = issuer.issue().await.unwrap();

        assert_eq!(
            token,
            IssuedToken {
                access_token: "spotify-access".to_string(),
                expires_in: 3600
            }
        );
    }

    #[tokio::test]
    async fn test_issue_rejects_body_without_token() {
        let base = spawn_upstream(Router::new().route("/api/token", post(token_endpoint))).await;
        let issuer = SpotifyRefreshIssuer::new(
            Client::new(),
            format!("{}/api/token", base),
            Some("client"),
            Some("wrong"),
            Some("refresh"),
        )
        .unwrap();

        let err = issuer.issue().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_issue_reports_upstream_status() {
        let base = spawn_upstream(Router::new()).await;
        let issuer = SpotifyRefreshIssuer::new(
            Client::new(),
            format!("{}/api/token", base),
            Some("client"),
            Some("secret"),
            Some("refresh"),
        )
        .unwrap();

        let err = issuer.issue().await.unwrap_err();
        assert!(matches!(err, AuthError::Upstream { status: 404, .. }));
    }
}
