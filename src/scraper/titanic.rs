//! Titanic (osu! private server) public API

use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{read_json, round_half_up, FetchError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeStats {
    pub mode: u8,
    #[serde(default)]
    pub pp: Option<f64>,
    #[serde(default)]
    pub acc: Option<f64>,
    #[serde(default)]
    pub playcount: Option<u64>,
    #[serde(default)]
    pub tscore: Option<u64>,
    #[serde(default)]
    pub rscore: Option<u64>,
    #[serde(default)]
    pub max_combo: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Placement {
    pub global: Option<u64>,
    pub country: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeRankings {
    #[serde(default)]
    pub performance: Option<Placement>,
}

/// Response of `/users/lookup/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct UserLookup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub stats: Vec<ModeStats>,
    #[serde(default)]
    pub rankings: HashMap<String, ModeRankings>,
}

/// osu! standard summary shown on the site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsuStats {
    pub username: String,
    pub rank: u64,
    pub country_rank: u64,
    pub pp: i64,
    pub accuracy: String,
    pub playcount: u64,
    pub level: i64,
    pub total_score: u64,
    pub ranked_score: u64,
    pub max_combo: u64,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OsuStats {
    /// Zeroed stats returned when Titanic cannot be reached
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            username: "N/A".to_string(),
            rank: 0,
            country_rank: 0,
            pp: 0,
            accuracy: "0.00".to_string(),
            playcount: 0,
            level: 0,
            total_score: 0,
            ranked_score: 0,
            max_combo: 0,
            country: "N/A".to_string(),
            error: Some(error.into()),
        }
    }
}

impl From<UserLookup> for OsuStats {
    fn from(data: UserLookup) -> Self {
        let standard = data
            .stats
            .iter()
            .find(|s| s.mode == 0)
            .cloned()
            .unwrap_or_default();
        let performance = data
            .rankings
            .get("0")
            .and_then(|r| r.performance.clone())
            .unwrap_or_default();
        let acc_percent = standard.acc.unwrap_or(0.0) * 100.0;

        OsuStats {
            username: data
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            rank: performance.global.unwrap_or(0),
            country_rank: performance.country.unwrap_or(0),
            pp: round_half_up(standard.pp.unwrap_or(0.0)),
            accuracy: format!("{:.2}", acc_percent),
            playcount: standard.playcount.unwrap_or(0),
            // Approximation, Titanic exposes no level
            level: acc_percent.floor() as i64,
            total_score: standard.tscore.unwrap_or(0),
            ranked_score: standard.rscore.unwrap_or(0),
            max_combo: standard.max_combo.unwrap_or(0),
            country: data
                .country
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            error: None,
        }
    }
}

pub async fn user_lookup(http: &Client, base: &str, user_id: u64) -> Result<UserLookup, FetchError> {
    let url = format!("{}/users/lookup/{}", base, user_id);
    tracing::debug!("Fetching Titanic lookup: {}", url);
    read_json(http.get(&url).send().await?).await
}

/// Raw user object, forwarded to the frontend as-is
pub async fn user(http: &Client, base: &str, user_id: u64) -> Result<Value, FetchError> {
    let url = format!("{}/users/{}", base, user_id);
    read_json(http.get(&url).send().await?).await
}

/// Top osu! standard plays, forwarded as-is
pub async fn top_plays(http: &Client, base: &str, user_id: u64) -> Result<Value, FetchError> {
    let url = format!("{}/users/{}/top/osu", base, user_id);
    read_json(http.get(&url).send().await?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn lookup_json() -> Value {
        json!({
            "id": 3505,
            "name": "rayuii",
            "country": "CA",
            "stats": [
                { "mode": 1, "pp": 10.0, "acc": 0.5 },
                { "mode": 0, "pp": 1234.6, "acc": 0.9876, "playcount": 4321, "tscore": 999, "rscore": 555, "max_combo": 1200 }
            ],
            "rankings": { "0": { "performance": { "global": 150, "country": 7 } } }
        })
    }

    #[test]
    fn test_stats_shaping() {
        let lookup: UserLookup = serde_json::from_value(lookup_json()).unwrap();
        let stats = OsuStats::from(lookup);

        assert_eq!(
            stats,
            OsuStats {
                username: "rayuii".to_string(),
                rank: 150,
                country_rank: 7,
                pp: 1235,
                accuracy: "98.76".to_string(),
                playcount: 4321,
                level: 98,
                total_score: 999,
                ranked_score: 555,
                max_combo: 1200,
                country: "CA".to_string(),
                error: None,
            }
        );
    }

    #[test]
    fn test_stats_shaping_with_missing_mode() {
        let lookup: UserLookup = serde_json::from_value(json!({ "name": "", "stats": [] })).unwrap();
        let stats = OsuStats::from(lookup);

        assert_eq!(stats.username, "N/A");
        assert_eq!(stats.accuracy, "0.00");
        assert_eq!(stats.rank, 0);
        assert_eq!(stats.country, "N/A");
    }

    #[test]
    fn test_fallback_serializes_error() {
        let value = serde_json::to_value(OsuStats::fallback("Failed to fetch stats")).unwrap();
        assert_eq!(value["error"], "Failed to fetch stats");
        assert_eq!(value["accuracy"], "0.00");

        let ok = serde_json::to_value(OsuStats::from(
            serde_json::from_value::<UserLookup>(lookup_json()).unwrap(),
        ))
        .unwrap();
        assert!(ok.get("error").is_none());
    }

    #[tokio::test]
    async fn test_fetchers_against_mock() {
        let base = spawn_upstream(
            Router::new()
                .route("/users/lookup/3505", get(|| async { Json(lookup_json()) }))
                .route("/users/3505/top/osu", get(|| async { Json(json!([{ "pp": 300 }])) }))
                .route("/users/3505", get(|| async { StatusCode::SERVICE_UNAVAILABLE })),
        )
        .await;
        let http = Client::new();

        let lookup = user_lookup(&http, &base, 3505).await.unwrap();
        assert_eq!(lookup.name.as_deref(), Some("rayuii"));

        let top = top_plays(&http, &base, 3505).await.unwrap();
        assert_eq!(top[0]["pp"], 300);

        let err = user(&http, &base, 3505).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[ignore]
    #[tokio::test]
    async fn test_live_user_lookup() {
        let http = crate::scraper::build_http_client().unwrap();
        let lookup = user_lookup(&http, "https://api.titanic.sh", 3505).await;
        assert!(lookup.is_ok());
    }
}
