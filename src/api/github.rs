use axum::{extract::State, response::Response, Json};

use super::cached;
use crate::error::ApiError;
use crate::scraper::github::{self, GithubSummary};
use crate::scraper::FetchError;
use crate::state::SharedState;

const STATS_CACHE: &str = "public, max-age=300, s-maxage=600";
const CONTRIBUTIONS_CACHE: &str = "public, max-age=3600";

/// Refused upstream requests and transport or decode failures carry
/// different messages
pub async fn github(State(state): State<SharedState>) -> Result<Json<GithubSummary>, ApiError> {
    let stats = github::stats(
        &state.http,
        &state.config.endpoints.github_api,
        &state.config.github_username,
    )
    .await
    .map_err(|e| match e {
        FetchError::Status { .. } => ApiError::failed("Failed to fetch GitHub stats", e),
        other => ApiError::failed("Internal server error", other),
    })?;

    Ok(Json(stats.summary))
}

/// Counters plus bio and location
pub async fn github_stats(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let stats = github::stats(
        &state.http,
        &state.config.endpoints.github_api,
        &state.config.github_username,
    )
    .await
    .map_err(|e| ApiError::failed("Failed to fetch GitHub stats", e))?;

    Ok(cached(STATS_CACHE, stats))
}

pub async fn github_contributions(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let contributions = github::contributions(
        &state.http,
        &state.config.endpoints.github_web,
        &state.config.github_username,
    )
    .await
    .map_err(|e| ApiError::failed("Failed to fetch GitHub contributions", e))?;

    Ok(cached(CONTRIBUTIONS_CACHE, contributions))
}
