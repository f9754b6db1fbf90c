//! osu! API v2 lookups plus scraping of the public profile page

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, read_json, FetchError};
use crate::auth::CredentialCache;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct Beatmap {
    pub id: u64,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatmapSet {
    pub id: u64,
    #[serde(default)]
    pub beatmaps: Vec<Beatmap>,
}

#[derive(Debug, Deserialize)]
struct BeatmapSearch {
    #[serde(default)]
    beatmapsets: Vec<BeatmapSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserStatistics {
    pub global_rank: Option<u64>,
    pub country_rank: Option<u64>,
    pub pp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserGroup {
    pub short_name: Option<String>,
    pub colour: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserTeam {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub tag: Option<String>,
    pub flag_url: Option<String>,
    pub header_url: Option<String>,
    pub logo_url: Option<String>,
}

/// User object as returned by `/api/v2/users/{user}/osu`
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: u64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub country_code: Option<String>,
    #[serde(default)]
    pub statistics: Option<UserStatistics>,
    pub is_online: Option<bool>,
    pub support_level: Option<u32>,
    #[serde(default)]
    pub groups: Option<Vec<UserGroup>>,
    #[serde(default)]
    pub team: Option<UserTeam>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub name: Option<String>,
    pub colour: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub flag_url: Option<String>,
}

/// The user card shown on the site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsuUser {
    pub id: u64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub country_code: Option<String>,
    pub global_rank: Option<u64>,
    pub country_rank: Option<u64>,
    pub pp: Option<f64>,
    pub is_online: Option<bool>,
    pub support_level: u32,
    pub groups: Vec<Group>,
    pub team: Option<Team>,
}

impl From<RawUser> for OsuUser {
    fn from(user: RawUser) -> Self {
        let stats = user.statistics.unwrap_or_default();

        let team = user.team.map(|t| {
            let flag_url = t
                .flag_url
                .or(t.header_url)
                .or(t.logo_url)
                .or_else(|| t.id.map(|id| format!("https://assets.ppy.sh/teams/flags/{}.png", id)));
            Team {
                id: t.id,
                name: t.name,
                short_name: t.short_name.or(t.tag),
                flag_url,
            }
        });

        OsuUser {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            country_code: user.country_code,
            global_rank: stats.global_rank,
            country_rank: stats.country_rank,
            pp: stats.pp,
            is_online: user.is_online,
            // is_supporter is unreliable, support_level > 0 is the real check
            support_level: user.support_level.unwrap_or(0),
            groups: user
                .groups
                .unwrap_or_default()
                .into_iter()
                .map(|g| Group {
                    name: g.short_name,
                    colour: g.colour,
                })
                .collect(),
            team,
        }
    }
}

/// Cover and country scraped from the profile page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OsuProfile {
    pub cover_url: Option<String>,
    pub country_code: Option<String>,
    pub country_name: Option<String>,
}

pub struct OsuClient {
    http: Client,
    base: String,
    tokens: Arc<CredentialCache>,
}

impl OsuClient {
    pub fn new(http: Client, base: impl Into<String>, tokens: Arc<CredentialCache>) -> Self {
        Self {
            http,
            base: base.into(),
            tokens,
        }
    }

    pub async fn search_beatmapsets(&self, title: &str) -> Result<Vec<BeatmapSet>, FetchError> {
        let token = self.tokens.bearer().await?;
        let url = format!("{}/api/v2/beatmapsets/search", self.base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(&[("q", title)])
            .send()
            .await?;

        let search: BeatmapSearch = read_json(response).await?;
        tracing::debug!("osu! search '{}' found {} beatmapsets", title, search.beatmapsets.len());
        Ok(search.beatmapsets)
    }

    pub async fn user(&self, username: &str) -> Result<RawUser, FetchError> {
        let token = self.tokens.bearer().await?;
        let url = format!(
            "{}/api/v2/users/{}/osu",
            self.base,
            urlencoding::encode(username)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(&[("key", "username")])
            .send()
            .await?;

        read_json(response).await
    }
}

/// Fetches the public profile page. Needs no token.
pub async fn profile(http: &Client, base: &str, user_id: &str) -> Result<OsuProfile, FetchError> {
    let url = format!("{}/users/{}", base, urlencoding::encode(user_id));

    let response = http
        .get(&url)
        .header("User-Agent", BROWSER_USER_AGENT)
        .header("Accept", "text/html")
        .send()
        .await?;

    let html = ensure_success(response).await?.text().await?;
    Ok(parse_profile(&html))
}

/// Drops the "Artist - " prefix and a trailing "(...)" group from a track name
pub fn extract_title(query: &str) -> String {
    static TRAILING_GROUP: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("valid regex"));

    let without_artist = match query.split_once(" - ") {
        Some((_, rest)) => rest,
        None => query,
    };
    let without_remixer = TRAILING_GROUP.replace(without_artist, "");
    let trimmed = without_remixer.trim();

    if trimmed.is_empty() {
        without_artist.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Picks the beatmap whose difficulty name best matches and returns its URL
///
/// Exact (case-insensitive) match first, then a partial match in either
/// direction, then the first beatmap of the first set.
pub fn pick_beatmap_url(sets: &[BeatmapSet], difficulty: &str) -> Option<String> {
    let wanted = difficulty.to_lowercase();

    let find = |matches: &dyn Fn(&str) -> bool| {
        sets.iter().find_map(|set| {
            set.beatmaps
                .iter()
                .find(|b| b.version.as_deref().map(|v| matches(&v.to_lowercase())).unwrap_or(false))
                .map(|b| (set, Some(b)))
        })
    };

    let (set, beatmap) = find(&|v| v == wanted)
        .or_else(|| find(&|v| v.contains(&wanted) || wanted.contains(v)))
        .or_else(|| sets.first().map(|set| (set, set.beatmaps.first())))?;

    Some(match beatmap {
        Some(beatmap) => format!("https://osu.ppy.sh/beatmapsets/{}#osu/{}", set.id, beatmap.id),
        None => format!("https://osu.ppy.sh/beatmapsets/{}", set.id),
    })
}

/// Pulls cover and country out of the JSON embedded in the profile HTML
pub fn parse_profile(html: &str) -> OsuProfile {
    static COVER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""cover_url":"([^"]+)""#).expect("valid regex"));
    static COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#""country":\{"code":"(\w+)","name":"([^"]+)"\}"#).expect("valid regex")
    });
    static COUNTRY_CODE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""country_code":"(\w+)""#).expect("valid regex"));

    // The user JSON is embedded HTML-entity-encoded
    let decoded = html
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#039;", "'");

    let mut profile = OsuProfile {
        cover_url: COVER
            .captures(&decoded)
            .map(|c| c[1].replace("\\/", "/")),
        ..Default::default()
    };

    if let Some(c) = COUNTRY.captures(&decoded) {
        profile.country_code = Some(c[1].to_string());
        profile.country_name = Some(c[2].to_string());
    } else if let Some(c) = COUNTRY_CODE.captures(&decoded) {
        profile.country_code = Some(c[1].to_string());
    }

    profile
}
