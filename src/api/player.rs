//! Spotify "current player" endpoint

use async_trait::async_trait;
use reqwest::StatusCode;

use super::client::check_response;
use super::PlaybackSource;
use crate::auth::TokenManager;
use crate::error::FetchError;
use crate::models::{now_secs, PlaybackSnapshot, PlayerResponse};

pub struct SpotifyPlayer {
    http: reqwest::Client,
    api_base: String,
    tokens: TokenManager,
}

impl SpotifyPlayer {
    pub fn new(http: reqwest::Client, api_base: &str, tokens: TokenManager) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl PlaybackSource for SpotifyPlayer {
    async fn fetch_current(&self) -> Result<Option<PlaybackSnapshot>, FetchError> {
        let token = self.tokens.get_valid_access_token().await?;
        let url = format!("{}/me/player", self.api_base);
        tracing::debug!("Spotify GET {}", url);

        let resp = self.http.get(&url).bearer_auth(&token).send().await?;
        let resp = check_response(resp).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let player: PlayerResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        let snapshot = player.into_snapshot(now_secs())?;
        if snapshot.is_none() {
            tracing::debug!("Player has no track loaded");
        }
        Ok(snapshot)
    }
}
