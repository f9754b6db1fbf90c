use std::sync::LazyLock;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{self, models::GuestbookEntry};
use crate::error::ApiError;
use crate::state::SharedState;

const MAX_NAME_CHARS: usize = 50;
const MAX_MESSAGE_CHARS: usize = 500;
const POST_INTERVAL_MINUTES: i64 = 5;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Entries newest first. A broken database shows an empty guestbook.
pub async fn list(State(state): State<SharedState>) -> Json<Vec<GuestbookEntry>> {
    match state.db.with_db(db::guestbook::list_entries).await {
        Ok(entries) => Json(entries),
        Err(err) => {
            error!("Failed to fetch guestbook: {:#}", err);
            Json(Vec::new())
        }
    }
}

#[derive(Debug, PartialEq)]
struct NewEntry {
    name: String,
    message: String,
}

/// Checks lengths on the raw input, then strips tags
fn validate(body: &Value) -> Result<NewEntry, ApiError> {
    let field = |key: &str| body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

    let (Some(name), Some(message)) = (field("name"), field("message")) else {
        return Err(ApiError::BadRequest("Name and message required".to_string()));
    };
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::BadRequest("Name too long (max 50 chars)".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest("Message too long (max 500 chars)".to_string()));
    }

    let entry = NewEntry {
        name: strip_tags(name),
        message: strip_tags(message),
    };
    if entry.name.is_empty() || entry.message.is_empty() {
        return Err(ApiError::BadRequest("Invalid input".to_string()));
    }
    Ok(entry)
}

pub async fn create(
    State(state): State<SharedState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<GuestbookEntry>), ApiError> {
    let body = body.map(|Json(value)| value).unwrap_or(Value::Null);
    let NewEntry { name, message } = validate(&body)?;

    let now = Utc::now();
    let since = timestamp(now - Duration::minutes(POST_INTERVAL_MINUTES));
    let entry = GuestbookEntry {
        id: Uuid::new_v4().to_string(),
        name,
        message,
        created_at: timestamp(now),
    };

    // Check and insert under one lock so two racing posts cannot both pass
    let saved = state
        .db
        .with_db(move |conn| {
            if db::guestbook::has_entry_since(conn, &entry.name, &since)? {
                return Ok(None);
            }
            db::guestbook::insert_entry(conn, &entry)?;
            db::guestbook::get_entry(conn, &entry.id)?
                .context("Entry missing right after insert")
                .map(Some)
        })
        .await
        .map_err(|e| ApiError::failed("Failed to post entry", e))?;

    let Some(saved) = saved else {
        return Err(ApiError::TooManyRequests(
            "Please wait a few minutes before posting again".to_string(),
        ));
    };

    info!("New guestbook entry {} from '{}'", saved.id, saved.name);
    Ok((StatusCode::CREATED, Json(saved)))
}
