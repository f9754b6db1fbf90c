use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::cached;
use crate::error::ApiError;
use crate::scraper::{weather::current_weather, FetchError};
use crate::state::SharedState;

const WEATHER_CACHE: &str = "public, max-age=600, s-maxage=900";

/// Current conditions for the configured city
pub async fn weather(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let api_key = state
        .config
        .openweather_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("Weather API key not configured".to_string()))?;

    let result = current_weather(
        &state.http,
        &state.config.endpoints.openweather,
        api_key,
        &state.config.weather_city,
    )
    .await;

    match result {
        Ok(weather) => Ok(cached(WEATHER_CACHE, weather)),
        // Upstream body is forwarded to make key and quota problems visible
        Err(FetchError::Status { status, body }) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "OpenWeather error", "status": status, "body": body })),
        )
            .into_response()),
        Err(err) => Err(ApiError::failed("Failed to fetch weather data", err)),
    }
}
