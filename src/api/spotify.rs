use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use super::cached;
use crate::error::ApiError;
use crate::scraper::spotify::{SpotifyClient, TimeRange};
use crate::state::{AppState, SharedState};

const RECENT_CACHE: &str = "public, max-age=0, s-maxage=60";
const TOP_CACHE: &str = "public, max-age=0, s-maxage=300";

fn client(state: &AppState) -> Result<&SpotifyClient, ApiError> {
    state.spotify.as_ref().ok_or_else(|| {
        ApiError::Configuration("Missing Spotify credentials in environment variables".to_string())
    })
}

/// Last 50 plays
pub async fn listening_history(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let items = client(&state)?
        .recently_played(50)
        .await
        .map_err(|e| ApiError::failed("Failed to fetch listening history", e))?;

    Ok(cached(RECENT_CACHE, items))
}

/// The single most recent play, `null` when the history is empty
pub async fn recent_tracks(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let items = client(&state)?
        .recently_played(1)
        .await
        .map_err(|e| ApiError::failed("Failed to fetch recently played tracks", e))?;

    Ok(cached(RECENT_CACHE, items.into_iter().next()))
}

#[derive(Debug, Deserialize)]
pub struct TopTracksQuery {
    time_range: Option<String>,
}

pub async fn top_tracks(
    State(state): State<SharedState>,
    Query(query): Query<TopTracksQuery>,
) -> Result<Response, ApiError> {
    let range: TimeRange = query
        .time_range
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid time_range".to_string()))?;

    let tracks = client(&state)?
        .top_tracks(range, 50)
        .await
        .map_err(|e| ApiError::failed("Failed to fetch top tracks", e))?;

    Ok(cached(TOP_CACHE, tracks))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{get, state_with};
    use crate::test_support::spawn_upstream;
    use axum::{extract::Query, http::StatusCode, routing::{get as get_route, post}, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const CREDENTIALS: [(&str, &str); 3] = [
        ("SPOTIFY_CLIENT_ID", "client"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
        ("SPOTIFY_REFRESH_TOKEN", "refresh"),
    ];

    fn track(name: &str) -> Value {
        json!({ "name": name, "artists": [{ "name": "Artist" }], "album": { "name": "Album", "images": [] } })
    }

    async fn mock_spotify(history_len: usize) -> String {
        spawn_upstream(
            Router::new()
                .route(
                    "/api/token",
                    post(|| async { Json(json!({ "access_token": "T", "token_type": "Bearer", "expires_in": 3600 })) }),
                )
                .route(
                    "/v1/me/player/recently-played",
                    get_route(move |Query(q): Query<HashMap<String, String>>| async move {
                        let limit: usize = q["limit"].parse().unwrap();
                        let items: Vec<Value> = (0..history_len.min(limit))
                            .map(|i| json!({ "track": track(&format!("Song {i}")), "played_at": "2026-10-01T00:00:00Z" }))
                            .collect();
                        Json(json!({ "items": items }))
                    }),
                )
                .route(
                    "/v1/me/top/tracks",
                    get_route(|| async { Json(json!({ "items": [track("Top")] })) }),
                ),
        )
        .await
    }

    #[tokio::test]
    async fn test_missing_credentials_is_500() {
        let state = state_with(&[], |_| {});

        let response = get(&state, "/api/listening-history").await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body["error"],
            "Missing Spotify credentials in environment variables"
        );
    }

    #[tokio::test]
    async fn test_listening_history_and_recent_track() {
        let base = mock_spotify(3).await;
        let state = state_with(&CREDENTIALS, |c| {
            c.endpoints.spotify_accounts = base.clone();
            c.endpoints.spotify_api = base.clone();
        });

        let history = get(&state, "/api/listening-history").await;
        assert_eq!(history.status, StatusCode::OK);
        assert_eq!(history.body.as_array().unwrap().len(), 3);
        assert_eq!(history.cache_control(), Some("public, max-age=0, s-maxage=60"));

        let recent = get(&state, "/api/recent-tracks").await;
        assert_eq!(recent.body["track"]["name"], "Song 0");
    }

    #[tokio::test]
    async fn test_recent_track_is_null_when_history_empty() {
        let base = mock_spotify(0).await;
        let state = state_with(&CREDENTIALS, |c| {
            c.endpoints.spotify_accounts = base.clone();
            c.endpoints.spotify_api = base.clone();
        });

        let recent = get(&state, "/api/recent-tracks").await;
        assert_eq!(recent.status, StatusCode::OK);
        assert_eq!(recent.body, Value::Null);
    }

    #[tokio::test]
    async fn test_top_tracks_validates_range_first() {
        let state = state_with(&[], |_| {});

        for uri in ["/api/top-tracks", "/api/top-tracks?time_range=forever"] {
            let response = get(&state, uri).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert_eq!(response.body["error"], "Invalid time_range");
        }
    }

    #[tokio::test]
    async fn test_top_tracks() {
        let base = mock_spotify(0).await;
        let state = state_with(&CREDENTIALS, |c| {
            c.endpoints.spotify_accounts = base.clone();
            c.endpoints.spotify_api = base.clone();
        });

        let response = get(&state, "/api/top-tracks?time_range=long_term").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body[0]["name"], "Top");
        assert_eq!(response.cache_control(), Some("public, max-age=0, s-maxage=300"));
    }

    #[tokio::test]
    async fn test_token_failure_is_500() {
        let base = spawn_upstream(Router::new().route(
            "/api/token",
            post(|| async { (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#) }),
        ))
        .await;
        let state = state_with(&CREDENTIALS, |c| {
            c.endpoints.spotify_accounts = base.clone();
            c.endpoints.spotify_api = base.clone();
        });

        let response = get(&state, "/api/listening-history").await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body["error"], "Failed to fetch listening history");
    }
}
