//! Authentication for the Spotify Web API
//!
//! Keeps a long-lived OAuth2 refresh token on disk and exchanges it for
//! short-lived access tokens whenever the current one is about to expire.

pub mod manager;
pub mod tokens;

use oauth2::{ClientId, ClientSecret};

pub use manager::TokenManager;
pub use tokens::FileTokenStore;

/// Spotify authorize endpoint. Unused by the refresh grant, but the
/// OAuth2 client requires one.
pub const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";

/// OAuth2 client credentials for the Spotify application
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn oauth_client_id(&self) -> ClientId {
        ClientId::new(self.client_id.clone())
    }

    pub fn oauth_client_secret(&self) -> ClientSecret {
        ClientSecret::new(self.client_secret.clone())
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
