use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::cached;
use crate::error::ApiError;
use crate::scraper::osu::{extract_title, pick_beatmap_url, profile, OsuProfile, OsuUser};
use crate::state::SharedState;

const USER_CACHE: &str = "public, max-age=60, s-maxage=300";
const PROFILE_CACHE: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    u: Option<String>,
}

fn null(status: StatusCode) -> Response {
    (status, Json(Value::Null)).into_response()
}

/// Shaped user card. Every failure answers `null` so the page can hide the card.
pub async fn osu_user(State(state): State<SharedState>, Query(query): Query<UserQuery>) -> Response {
    let Some(username) = query.u.filter(|u| !u.is_empty()) else {
        return null(StatusCode::BAD_REQUEST);
    };
    let Some(client) = state.osu.as_ref() else {
        error!("osu! user lookup without OSU_CLIENT_ID/OSU_CLIENT_SECRET");
        return null(StatusCode::INTERNAL_SERVER_ERROR);
    };

    match client.user(&username).await {
        Ok(raw) => cached(USER_CACHE, OsuUser::from(raw)),
        Err(err) if err.status().is_some() => null(StatusCode::OK),
        Err(err) => {
            error!("osu! user fetch error: {:#}", err);
            null(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BeatmapQuery {
    q: Option<String>,
    difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BeatmapUrl {
    url: Option<String>,
}

pub async fn osu_beatmap(
    State(state): State<SharedState>,
    Query(query): Query<BeatmapQuery>,
) -> Response {
    let none = |status: StatusCode| (status, Json(BeatmapUrl { url: None })).into_response();

    let Some(q) = query.q.filter(|q| !q.is_empty()) else {
        return none(StatusCode::BAD_REQUEST);
    };
    let difficulty = query.difficulty.unwrap_or_default();
    let Some(client) = state.osu.as_ref() else {
        error!("osu! beatmap lookup without OSU_CLIENT_ID/OSU_CLIENT_SECRET");
        return none(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let title = extract_title(&q);
    debug!("osu! lookup: query='{}' title='{}' difficulty='{}'", q, title, difficulty);

    match client.search_beatmapsets(&title).await {
        Ok(sets) => match pick_beatmap_url(&sets, &difficulty) {
            Some(url) => {
                debug!("Resolved beatmap: {}", url);
                cached(USER_CACHE, BeatmapUrl { url: Some(url) })
            }
            None => none(StatusCode::OK),
        },
        Err(err) if err.status().is_some() => none(StatusCode::OK),
        Err(err) => {
            error!("osu! API error: {:#}", err);
            none(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    id: Option<String>,
}

pub async fn osu_profile(
    State(state): State<SharedState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, ApiError> {
    let user_id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing user id".to_string()))?;

    let response = match profile(&state.http, &state.config.endpoints.osu, &user_id).await {
        Ok(profile) => cached(PROFILE_CACHE, profile),
        Err(err) if err.status().is_some() => Json(OsuProfile::default()).into_response(),
        Err(err) => {
            warn!("Error fetching osu! profile {}: {:#}", user_id, err);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(OsuProfile::default())).into_response()
        }
    };
    Ok(response)
}
