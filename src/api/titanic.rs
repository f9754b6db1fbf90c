use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::error;

use super::cached;
use crate::error::ApiError;
use crate::scraper::{titanic, FetchError};
use crate::state::SharedState;

const STATS_CACHE: &str = "public, max-age=300, s-maxage=600";

/// Always answers 200 so the page keeps rendering; failures carry `error`
pub async fn osu_stats(State(state): State<SharedState>) -> Response {
    let endpoints = &state.config.endpoints;
    match titanic::user_lookup(&state.http, &endpoints.titanic_api, state.config.titanic_user_id).await
    {
        Ok(lookup) => cached(STATS_CACHE, titanic::OsuStats::from(lookup)),
        Err(err) => {
            error!("Titanic API error: {:#}", err);
            Json(titanic::OsuStats::fallback("Failed to fetch stats")).into_response()
        }
    }
}

/// Non-2xx answers keep the upstream status
fn passthrough(result: Result<Value, FetchError>, message: &'static str) -> Result<Json<Value>, ApiError> {
    match result {
        Ok(value) => Ok(Json(value)),
        Err(FetchError::Status { status, .. }) => Err(ApiError::Mirrored {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            message: message.to_string(),
        }),
        Err(err) => Err(ApiError::failed("Internal server error", err)),
    }
}

pub async fn titanic_user(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let result = titanic::user(
        &state.http,
        &state.config.endpoints.titanic_api,
        state.config.titanic_user_id,
    )
    .await;
    passthrough(result, "Failed to fetch Titanic user stats")
}

pub async fn titanic_osu(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let result = titanic::top_plays(
        &state.http,
        &state.config.endpoints.titanic_api,
        state.config.titanic_user_id,
    )
    .await;
    passthrough(result, "Failed to fetch osu! stats")
}
