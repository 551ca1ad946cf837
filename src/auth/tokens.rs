//! Token storage and management

use anyhow::{Context, Result};
use oauth2::basic::BasicTokenType;
use oauth2::{ExtraTokenFields, StandardTokenResponse, TokenResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AuthError, ConfigError};

/// Refresh when fewer than this many seconds of validity remain
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Current wall-clock time in unix seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Provider fields outside the OAuth2 standard set, kept verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTokenFields {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ExtraTokenFields for RawTokenFields {}

/// Token endpoint response
pub type SpotifyTokenResponse = StandardTokenResponse<RawTokenFields, BasicTokenType>;

/// Stored Spotify token, plus whatever else the provider sent back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: i64,
    /// Provider fields we don't interpret (token_type, scope, expires_in, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredToken {
    pub fn new(access_token: String, refresh_token: String, expires_at: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            extra: Map::new(),
        }
    }

    /// True if there is no access token or it expires within the skew window.
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.access_token.is_empty() || self.expires_at.saturating_sub(now) < EXPIRY_SKEW_SECS
    }

    /// Merge a token endpoint response into this token.
    ///
    /// `expires_in` is required. `refresh_token` is only replaced when the
    /// provider rotated it. Nothing is modified on error.
    pub fn merge(&mut self, response: &SpotifyTokenResponse, now: i64) -> Result<(), AuthError> {
        let access_token = response.access_token().secret();
        if access_token.is_empty() {
            return Err(AuthError::Malformed("empty access_token".into()));
        }
        let expires_in = response
            .expires_in()
            .ok_or_else(|| AuthError::Malformed("missing expires_in".into()))?
            .as_secs();
        let expires_at = i64::try_from(expires_in)
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| AuthError::Malformed(format!("expires_in out of range: {}", expires_in)))?;

        let mut extra = response.extra_fields().fields.clone();
        for key in ["access_token", "refresh_token", "expires_at"] {
            extra.remove(key);
        }
        if let Ok(token_type) = serde_json::to_value(response.token_type()) {
            extra.insert("token_type".into(), token_type);
        }
        if let Some(scopes) = response.scopes() {
            let scope = scopes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
            extra.insert("scope".into(), Value::String(scope));
        }
        extra.insert("expires_in".into(), Value::from(expires_in));

        self.access_token = access_token.clone();
        if let Some(rt) = response.refresh_token().filter(|rt| !rt.secret().is_empty()) {
            self.refresh_token = rt.secret().clone();
        }
        self.expires_at = expires_at;
        self.extra.extend(extra);
        Ok(())
    }
}

/// Token store trait for different storage backends
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<StoredToken, ConfigError>;
    fn save(&self, token: &StoredToken) -> Result<()>;
}

/// JSON file on disk, replaced wholesale on every save
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredToken, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create token directory")?;
        }

        let content = serde_json::to_string_pretty(token).context("Failed to serialize token")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).context("Failed to write token file")?;

        // Set restrictive permissions on token file before it becomes visible
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&tmp, perms).context("Failed to set token permissions")?;
        }

        fs::rename(&tmp, &self.path).context("Failed to replace token file")?;
        Ok(())
    }
}
