use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::scraper::read_json;
use crate::state::SharedState;

/// `{text}` in, `{text, romanized}` out, or the remote service's answer
/// when one is configured
pub async fn romanize(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let text = body
        .ok()
        .and_then(|Json(value)| value.get("text").and_then(Value::as_str).map(str::to_string))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing text".to_string()))?;

    if let Some(service) = state.config.romanize_service_url.as_deref() {
        let response = state
            .http
            .post(service)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ApiError::failed("Failed to romanize", e))?;
        let value: Value = read_json(response)
            .await
            .map_err(|e| ApiError::failed("Failed to romanize", e))?;
        return Ok(Json(value));
    }

    let romanized = state
        .romanizer
        .romanize(&text)
        .await
        .map_err(|e| ApiError::failed("Failed to romanize", e))?;

    Ok(Json(json!({ "text": text, "romanized": romanized })))
}
