use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::auth::store::StoreKind;

/// Base URLs of every upstream service
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub spotify_accounts: String,
    pub spotify_api: String,
    pub osu: String,
    pub titanic_api: String,
    pub openweather: String,
    pub ipgeolocation: String,
    pub github_api: String,
    pub github_web: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            spotify_accounts: "https://accounts.spotify.com".to_string(),
            spotify_api: "https://api.spotify.com".to_string(),
            osu: "https://osu.ppy.sh".to_string(),
            titanic_api: "https://api.titanic.sh".to_string(),
            openweather: "https://api.openweathermap.org".to_string(),
            ipgeolocation: "https://api.ipgeolocation.io".to_string(),
            github_api: "https://api.github.com".to_string(),
            github_web: "https://github.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub credential_store: StoreKind,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_refresh_token: Option<String>,
    pub osu_client_id: Option<String>,
    pub osu_client_secret: Option<String>,
    pub openweather_api_key: Option<String>,
    pub weather_city: String,
    pub ipgeolocation_api_key: Option<String>,
    pub github_username: String,
    pub titanic_user_id: u64,
    pub romanize_dict_path: PathBuf,
    pub romanize_service_url: Option<String>,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| {
            let value = lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            if value.is_none() {
                warn!("{key} not set");
            }
            value
        };

        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            database_path: try_load(&lookup, "DATABASE_PATH", "portfolio.db")?,
            credential_store: try_load(&lookup, "CREDENTIAL_STORE", "memory")?,
            spotify_client_id: secret("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: secret("SPOTIFY_CLIENT_SECRET"),
            spotify_refresh_token: secret("SPOTIFY_REFRESH_TOKEN"),
            osu_client_id: secret("OSU_CLIENT_ID"),
            osu_client_secret: secret("OSU_CLIENT_SECRET"),
            openweather_api_key: secret("OPENWEATHER_API_KEY"),
            weather_city: try_load(&lookup, "WEATHER_CITY", "Vancouver")?,
            ipgeolocation_api_key: secret("IPGEOLOCATION_API_KEY"),
            github_username: try_load(&lookup, "GITHUB_USERNAME", "rayuii")?,
            titanic_user_id: try_load(&lookup, "TITANIC_USER_ID", "3505")?,
            romanize_dict_path: try_load(&lookup, "ROMANIZE_DICT_PATH", "data/romaji_dict.tsv")?,
            romanize_service_url: lookup("ROMANIZE_SERVICE_URL").filter(|v| !v.trim().is_empty()),
            endpoints: Endpoints::default(),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}
