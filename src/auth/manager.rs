//! Access token lifecycle: refresh-on-demand and persistence

use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{AuthUrl, Client, RefreshToken, RequestTokenError, StandardRevocableToken, TokenUrl};
use tokio::sync::Mutex;

use super::tokens::{unix_now, SpotifyTokenResponse, StoredToken, TokenStore};
use super::{ClientCredentials, SPOTIFY_AUTH_URL};
use crate::api::client::oauth_http_client;
use crate::error::{AuthError, ConfigError};

/// `BasicClient` with a token response that keeps unknown provider fields
type SpotifyOAuthClient = Client<
    BasicErrorResponse,
    SpotifyTokenResponse,
    BasicTokenType,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
>;

/// Owns the single Spotify token for the process.
///
/// The token sits behind an async mutex that is held for the whole refresh
/// exchange, so concurrent callers wait on one in-flight refresh instead of
/// starting their own.
pub struct TokenManager {
    http: reqwest::Client,
    oauth: SpotifyOAuthClient,
    store: Box<dyn TokenStore>,
    token: Mutex<StoredToken>,
}

impl TokenManager {
    /// Load the persisted token. Fails if the store has not been seeded.
    ///
    /// Client credentials go in an HTTP Basic header (the client's default
    /// auth type).
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        credentials: &ClientCredentials,
        store: Box<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        let oauth = SpotifyOAuthClient::new(
            credentials.oauth_client_id(),
            Some(credentials.oauth_client_secret()),
            AuthUrl::new(SPOTIFY_AUTH_URL.to_string())?,
            Some(TokenUrl::new(token_url.into())?),
        );
        let token = store.load()?;
        Ok(Self {
            http,
            oauth,
            store,
            token: Mutex::new(token),
        })
    }

    /// Return an access token with at least a minute of validity left,
    /// refreshing it first if necessary.
    pub async fn get_valid_access_token(&self) -> Result<String, AuthError> {
        let mut token = self.token.lock().await;
        if token.needs_refresh(unix_now()) {
            self.refresh(&mut token).await?;
        }
        Ok(token.access_token.clone())
    }

    async fn refresh(&self, token: &mut StoredToken) -> Result<(), AuthError> {
        tracing::info!("Refreshing Spotify access token...");

        let refresh_token = RefreshToken::new(token.refresh_token.clone());
        let response = self
            .oauth
            .exchange_refresh_token(&refresh_token)
            .request_async(|request| oauth_http_client(&self.http, request))
            .await
            .map_err(token_error)?;

        token.merge(&response, unix_now())?;

        if let Err(e) = self.store.save(token) {
            tracing::warn!("Failed to persist refreshed token: {:#}", e);
        }
        tracing::info!("Token refreshed (expires_at: {})", token.expires_at);
        Ok(())
    }
}

fn token_error(err: RequestTokenError<reqwest::Error, BasicErrorResponse>) -> AuthError {
    match err {
        RequestTokenError::ServerResponse(resp) => {
            AuthError::Rejected(serde_json::to_string(&resp).unwrap_or_default())
        }
        RequestTokenError::Request(e) => AuthError::Transport(e),
        RequestTokenError::Parse(e, body) => AuthError::Malformed(format!(
            "{} (body: {})",
            e,
            String::from_utf8_lossy(&body)
        )),
        RequestTokenError::Other(msg) => AuthError::Malformed(msg),
    }
}
