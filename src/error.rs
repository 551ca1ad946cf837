//! Error types for startup and for each stage of a poll cycle

use std::path::PathBuf;

use crate::api::client::HttpFailure;

/// Fatal errors raised while the process is starting up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("vault credentials must look like `username:password`")]
    BadCredentials,

    #[error("vault request failed: {0}")]
    Vault(String),

    #[error("secret `{0}` is missing or not a plain string")]
    MissingSecret(String),

    #[error("invalid HTTP client settings: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),
}

/// Token refresh failures. The stale token is never used as a fallback.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint rejected the refresh: {0}")]
    Rejected(String),

    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// Playback query failures that cannot be read as "nothing is playing".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("player request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("player endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed player response: {0}")]
    Malformed(String),
}

/// Status publish failures.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("status request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("status API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("malformed status response: {0}")]
    Malformed(String),
}

impl From<HttpFailure> for FetchError {
    fn from(f: HttpFailure) -> Self {
        FetchError::Http {
            status: f.status,
            body: f.body,
        }
    }
}

impl From<HttpFailure> for PublishError {
    fn from(f: HttpFailure) -> Self {
        PublishError::Http {
            status: f.status,
            body: f.body,
        }
    }
}
