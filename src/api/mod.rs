//! HTTP routes under `/api`

pub mod github;
pub mod guestbook;
pub mod osu;
pub mod romanize;
pub mod spotify;
pub mod timezone;
pub mod titanic;
pub mod weather;

use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::state::SharedState;

/// JSON body with a `Cache-Control` header for CDN caching
pub(crate) fn cached<T: Serialize>(cache_control: &'static str, body: T) -> Response {
    ([(header::CACHE_CONTROL, cache_control)], Json(body)).into_response()
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        // Spotify
        .route("/api/listening-history", get(spotify::listening_history))
        .route("/api/recent-tracks", get(spotify::recent_tracks))
        .route("/api/top-tracks", get(spotify::top_tracks))
        // osu!
        .route("/api/osu-user", get(osu::osu_user))
        .route("/api/osu-beatmap", get(osu::osu_beatmap))
        .route("/api/osu-profile", get(osu::osu_profile))
        // Titanic
        .route("/api/osu-stats", get(titanic::osu_stats))
        .route("/api/titanic-user", get(titanic::titanic_user))
        .route("/api/titanic-osu", get(titanic::titanic_osu))
        .route("/api/weather", get(weather::weather))
        .route("/api/timezone", get(timezone::timezone))
        // GitHub
        .route("/api/github", get(github::github))
        .route("/api/github-stats", get(github::github_stats))
        .route("/api/github-contributions", get(github::github_contributions))
        .route("/api/guestbook", get(guestbook::list).post(guestbook::create))
        .route("/api/romanize", post(romanize::romanize))
        .with_state(state)
}
