use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::auth::{
    CredentialCache, CredentialStore, OsuClientCredentialsIssuer, SpotifyRefreshIssuer,
};
use crate::config::Config;
use crate::db::Database;
use crate::romanize::Romanizer;
use crate::scraper::{osu::OsuClient, spotify::SpotifyClient};

/// Spotify access tokens are used until the exact expiry
const SPOTIFY_MARGIN_SECS: i64 = 0;
/// osu! tokens are refreshed a minute early
const OSU_MARGIN_SECS: i64 = 60;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub http: Client,
    /// `None` when the Spotify credentials are not configured
    pub spotify: Option<SpotifyClient>,
    /// `None` when the osu! credentials are not configured
    pub osu: Option<OsuClient>,
    pub romanizer: Romanizer,
}

impl AppState {
    pub fn new(config: Config, db: Database, http: Client) -> Self {
        let store = config.credential_store.build(&db);
        info!("Credential store: {:?}", config.credential_store);

        let spotify = build_spotify(&config, &http, store.clone());
        let osu = build_osu(&config, &http, store);
        let romanizer = Romanizer::new(config.romanize_dict_path.clone());

        Self {
            config,
            db,
            http,
            spotify,
            osu,
            romanizer,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}

fn build_spotify(
    config: &Config,
    http: &Client,
    store: Arc<dyn CredentialStore>,
) -> Option<SpotifyClient> {
    let endpoints = &config.endpoints;
    let issuer = SpotifyRefreshIssuer::new(
        http.clone(),
        format!("{}/api/token", endpoints.spotify_accounts),
        config.spotify_client_id.as_deref(),
        config.spotify_client_secret.as_deref(),
        config.spotify_refresh_token.as_deref(),
    );

    match issuer {
        Ok(issuer) => {
            let tokens = CredentialCache::new("spotify", store, Arc::new(issuer), SPOTIFY_MARGIN_SECS);
            Some(SpotifyClient::new(
                http.clone(),
                endpoints.spotify_api.clone(),
                Arc::new(tokens),
            ))
        }
        Err(err) => {
            warn!("Spotify routes disabled: {}", err);
            None
        }
    }
}

fn build_osu(config: &Config, http: &Client, store: Arc<dyn CredentialStore>) -> Option<OsuClient> {
    let endpoints = &config.endpoints;
    let issuer = OsuClientCredentialsIssuer::new(
        http.clone(),
        format!("{}/oauth/token", endpoints.osu),
        config.osu_client_id.as_deref(),
        config.osu_client_secret.as_deref(),
    );

    match issuer {
        Ok(issuer) => {
            // One token shared by the user and beatmap lookups
            let tokens = CredentialCache::new("osu", store, Arc::new(issuer), OSU_MARGIN_SECS);
            Some(OsuClient::new(http.clone(), endpoints.osu.clone(), Arc::new(tokens)))
        }
        Err(err) => {
            warn!("osu! API routes disabled: {}", err);
            None
        }
    }
}
