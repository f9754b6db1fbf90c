//! GitHub REST stats and the public contribution calendar

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use super::{ensure_success, read_json, FetchError};

const GITHUB_JSON: &str = "application/vnd.github.v3+json";

static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[data-date][data-level]").expect("valid selector"));
static TOOLTIP_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tool-tip[for]").expect("valid selector"));
static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*) contributions?").expect("valid regex"));
static RAW_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-date="(\d{4}-\d{2}-\d{2})"[^>]*data-level="(\d)""#).expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    following: u64,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GithubSummary {
    pub repos: u64,
    pub stars: u64,
    pub forks: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GithubStats {
    #[serde(flatten)]
    pub summary: GithubSummary,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Always 0, the REST API does not expose yearly contributions
    pub contributions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionDay {
    pub date: String,
    pub count: u64,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributions {
    pub days: Vec<ContributionDay>,
    pub total: u64,
}

/// Profile counters plus star and fork totals over the first 100 repos
pub async fn stats(http: &Client, api_base: &str, username: &str) -> Result<GithubStats, FetchError> {
    let user_url = format!("{}/users/{}", api_base, username);
    let repos_url = format!("{}/users/{}/repos?per_page=100", api_base, username);
    tracing::debug!("Fetching GitHub stats for {}", username);

    let (user, repos) = tokio::try_join!(
        get_json::<RawUser>(http, &user_url),
        get_json::<Vec<RawRepo>>(http, &repos_url)
    )?;

    Ok(GithubStats {
        summary: GithubSummary {
            repos: user.public_repos,
            stars: repos.iter().map(|r| r.stargazers_count).sum(),
            forks: repos.iter().map(|r| r.forks_count).sum(),
            followers: user.followers,
            following: user.following,
        },
        bio: user.bio,
        location: user.location,
        contributions: 0,
    })
}

async fn get_json<T: serde::de::DeserializeOwned>(http: &Client, url: &str) -> Result<T, FetchError> {
    let resp = http.get(url).header(ACCEPT, GITHUB_JSON).send().await?;
    read_json(resp).await
}

pub async fn contributions(
    http: &Client,
    web_base: &str,
    username: &str,
) -> Result<Contributions, FetchError> {
    let url = format!("{}/users/{}/contributions", web_base, username);
    tracing::debug!("Fetching GitHub contributions: {}", url);

    let resp = http.get(&url).header(ACCEPT, "text/html").send().await?;
    let html = ensure_success(resp).await?.text().await?;

    Ok(parse_contributions(&html))
}

fn parse_count(text: &str) -> Option<u64> {
    if text.trim_start().starts_with("No contributions") {
        return Some(0);
    }
    COUNT_RE
        .captures(text)
        .and_then(|c| c[1].replace(',', "").parse().ok())
}

/// Parses the calendar table. Falls back to a raw regex scan when the
/// markup has no recognizable cells.
pub fn parse_contributions(html: &str) -> Contributions {
    let mut days = parse_cells(html);
    if days.is_empty() {
        days = scan_raw(html);
    }
    days.sort_by(|a, b| a.date.cmp(&b.date));

    let total = days.iter().map(|d| d.count).sum();
    Contributions { days, total }
}

fn parse_cells(html: &str) -> Vec<ContributionDay> {
    let document = Html::parse_document(html);

    let tooltips: HashMap<&str, String> = document
        .select(&TOOLTIP_SELECTOR)
        .filter_map(|t| {
            let target = t.value().attr("for")?;
            Some((target, t.text().collect::<String>()))
        })
        .collect();

    let mut days = Vec::new();
    for cell in document.select(&CELL_SELECTOR) {
        let attrs = cell.value();
        let (Some(date), Some(level)) = (attrs.attr("data-date"), attrs.attr("data-level")) else {
            continue;
        };
        let Ok(level) = level.parse::<u8>() else {
            continue;
        };

        let count = attrs
            .id()
            .and_then(|id| tooltips.get(id))
            .and_then(|text| parse_count(text))
            .or_else(|| parse_count(&cell.text().collect::<String>()))
            .unwrap_or(level as u64);

        days.push(ContributionDay {
            date: date.to_string(),
            count,
            level,
        });
    }
    days
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn scan_raw(html: &str) -> Vec<ContributionDay> {
    RAW_CELL_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let level: u8 = caps[2].parse().ok()?;

            let start = floor_boundary(html, whole.start().saturating_sub(200));
            let end = floor_boundary(html, whole.start() + 200);
            let count = parse_count(&html[start..end]).unwrap_or(level as u64);

            Some(ContributionDay {
                date: caps[1].to_string(),
                count,
                level,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    const CALENDAR: &str = r#"
<table class="ContributionCalendar-grid">
  <tbody>
    <tr>
      <td tabindex="0" data-ix="1" data-date="2026-01-02" id="contribution-day-component-0-1" data-level="2" class="ContributionCalendar-day"></td>
      <td tabindex="0" data-ix="0" data-date="2026-01-01" id="contribution-day-component-0-0" data-level="0" class="ContributionCalendar-day"></td>
      <td tabindex="0" data-ix="2" data-date="2026-01-03" id="contribution-day-component-0-2" data-level="4" class="ContributionCalendar-day"></td>
      <td tabindex="0" data-ix="3" data-date="2026-01-04" id="contribution-day-component-0-3" data-level="1" class="ContributionCalendar-day"></td>
    </tr>
  </tbody>
</table>
<tool-tip for="contribution-day-component-0-0" class="sr-only">No contributions on January 1st.</tool-tip>
<tool-tip for="contribution-day-component-0-1" class="sr-only">5 contributions on January 2nd.</tool-tip>
<tool-tip for="contribution-day-component-0-2" class="sr-only">1,204 contributions on January 3rd.</tool-tip>
"#;

    #[test]
    fn test_parse_calendar_with_tooltips() {
        let parsed = parse_contributions(CALENDAR);

        let dates: Vec<&str> = parsed.days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, ["2026-01-01", "2026-01-02", "2026-01-03", "2026-01-04"]);

        let counts: Vec<u64> = parsed.days.iter().map(|d| d.count).collect();
        // Last cell has no tooltip, count comes from its level
        assert_eq!(counts, [0, 5, 1204, 1]);
        assert_eq!(parsed.days[2].level, 4);
        assert_eq!(parsed.total, 1210);
    }

    #[test]
    fn test_parse_singular_contribution() {
        assert_eq!(parse_count("1 contribution on May 3rd."), Some(1));
        assert_eq!(parse_count("No contributions on May 4th."), Some(0));
        assert_eq!(parse_count("nothing here"), None);
    }

    #[test]
    fn test_raw_fallback_when_no_cells() {
        // Attributes on a non-td element, so the selector finds nothing
        let html = r#"<rect data-date="2026-02-02" data-level="3"></rect><span>7 contributions</span>
<rect data-date="2026-02-01" data-level="1"></rect>"#;

        let parsed = parse_contributions(html);

        assert_eq!(parsed.days.len(), 2);
        assert_eq!(parsed.days[0].date, "2026-02-01");
        assert_eq!(parsed.days[1].date, "2026-02-02");
        assert_eq!(parsed.days[1].count, 7);
        assert_eq!(parsed.days[1].level, 3);
    }

    #[test]
    fn test_raw_fallback_window_respects_multibyte_text() {
        let padding = "日本語".repeat(100);
        let html = format!(
            r#"{padding}<rect data-date="2026-03-01" data-level="2"></rect>{padding}"#
        );

        let parsed = parse_contributions(&html);

        assert_eq!(parsed.days.len(), 1);
        assert_eq!(parsed.days[0].count, 2);
    }

    #[test]
    fn test_parse_empty_page() {
        let parsed = parse_contributions("<html><body></body></html>");
        assert!(parsed.days.is_empty());
        assert_eq!(parsed.total, 0);
    }

    #[tokio::test]
    async fn test_stats_sums_repos() {
        let base = spawn_upstream(
            Router::new()
                .route(
                    "/users/rayuii",
                    get(|| async {
                        Json(json!({
                            "login": "rayuii", "public_repos": 12, "followers": 30,
                            "following": 4, "bio": "hi", "location": null
                        }))
                    }),
                )
                .route(
                    "/users/rayuii/repos",
                    get(|| async {
                        Json(json!([
                            { "name": "a", "stargazers_count": 3, "forks_count": 1 },
                            { "name": "b", "stargazers_count": 7, "forks_count": 0 }
                        ]))
                    }),
                ),
        )
        .await;

        let stats = stats(&Client::new(), &base, "rayuii").await.unwrap();

        assert_eq!(
            stats.summary,
            GithubSummary { repos: 12, stars: 10, forks: 1, followers: 30, following: 4 }
        );
        assert_eq!(stats.bio.as_deref(), Some("hi"));
        assert_eq!(stats.location, None);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["stars"], 10);
        assert_eq!(value["contributions"], 0);
    }

    #[tokio::test]
    async fn test_stats_fails_when_repos_fail() {
        let base = spawn_upstream(
            Router::new()
                .route("/users/rayuii", get(|| async { Json(json!({ "public_repos": 1 })) }))
                .route("/users/rayuii/repos", get(|| async { StatusCode::FORBIDDEN })),
        )
        .await;

        let err = stats(&Client::new(), &base, "rayuii").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_contributions_fetch() {
        let base = spawn_upstream(Router::new().route(
            "/users/rayuii/contributions",
            get(|| async { axum::response::Html(CALENDAR) }),
        ))
        .await;

        let parsed = contributions(&Client::new(), &base, "rayuii").await.unwrap();
        assert_eq!(parsed.total, 1210);
    }

    #[ignore]
    #[tokio::test]
    async fn test_live_contributions() {
        let http = crate::scraper::build_http_client().unwrap();
        let parsed = contributions(&http, "https://github.com", "rayuii").await.unwrap();
        assert!(!parsed.days.is_empty());
        assert_eq!(parsed.total, parsed.days.iter().map(|d| d.count).sum::<u64>());
    }
}
