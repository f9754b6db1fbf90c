use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::scraper::{timezone, FetchError};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct TimezoneQuery {
    location: Option<String>,
}

pub async fn timezone(
    State(state): State<SharedState>,
    Query(query): Query<TimezoneQuery>,
) -> Result<Json<Value>, ApiError> {
    let location = query
        .location
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing location parameter".to_string()))?;
    let api_key = state
        .config
        .ipgeolocation_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("API key not configured".to_string()))?;

    match timezone::lookup(&state.http, &state.config.endpoints.ipgeolocation, api_key, &location).await {
        Ok(value) => Ok(Json(value)),
        Err(FetchError::Status { .. }) => {
            Err(ApiError::Upstream("Failed to fetch timezone info".to_string()))
        }
        Err(err) => Err(ApiError::failed("Server error", err)),
    }
}
