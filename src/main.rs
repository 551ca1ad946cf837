//! vkotify - mirror the current Spotify track into a VK status
//!
//! Resolves credentials from vault, then polls Spotify forever and
//! rewrites the VK status whenever the rendered text changes.

mod api;
mod auth;
mod config;
mod error;
mod models;
mod poll;
mod secrets;
mod status;

use anyhow::Result;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{SpotifyPlayer, VkStatus};
use auth::{ClientCredentials, FileTokenStore, TokenManager};
use config::{Settings, REQUIRED_SECRETS, SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET, VK_TOKEN};
use error::ConfigError;
use poll::PollLoop;
use status::StatusRenderer;

/// Everything that must succeed before the loop may start.
async fn start(settings: &Settings) -> Result<PollLoop<SpotifyPlayer, VkStatus>, ConfigError> {
    let http = api::client::build_http(settings.poll.request_timeout())?;

    tracing::info!("Resolving secrets from {}...", settings.vault.url);
    let secrets = secrets::load_secrets(&http, &settings.vault, &REQUIRED_SECRETS).await?;
    let credentials = ClientCredentials::new(
        secrets.require(SPOTIFY_CLIENT_ID)?,
        secrets.require(SPOTIFY_CLIENT_SECRET)?,
    );

    let store = FileTokenStore::new(settings.token_path.clone());
    tracing::info!("Loading Spotify token from {}", store.path().display());
    let tokens = TokenManager::new(
        http.clone(),
        settings.spotify.token_url.as_str(),
        &credentials,
        Box::new(store),
    )?;

    let player = SpotifyPlayer::new(http.clone(), &settings.spotify.api_base, tokens);
    let publisher = VkStatus::new(http, &settings.vk, secrets.require(VK_TOKEN)?);
    let renderer = StatusRenderer::new(
        settings.status.label.as_str(),
        Duration::from_secs(settings.status.idle_clear_secs),
    );

    Ok(PollLoop::new(player, publisher, renderer, &settings.poll))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = Settings::load()?;
    let poll_loop = start(&settings).await?;
    poll_loop.run().await;

    Ok(())
}
