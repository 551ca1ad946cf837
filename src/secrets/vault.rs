//! HashiCorp Vault KV v2 client (userpass login)

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

use super::{SecretValue, Secrets};
use crate::api::client::check_response;
use crate::config::VaultSettings;
use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct KvResponse {
    data: KvData,
}

#[derive(Debug, Deserialize)]
struct KvData {
    data: Map<String, Value>,
}

/// Bootstrap `username:password` pair
#[derive(Clone)]
pub struct VaultCredentials {
    pub username: String,
    pub password: String,
}

impl VaultCredentials {
    /// Split on the first `:`; the password may itself contain colons.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (username, password) = raw
            .trim()
            .split_once(':')
            .ok_or(ConfigError::BadCredentials)?;
        if username.is_empty() {
            return Err(ConfigError::BadCredentials);
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }
}

/// Authenticated vault session
pub struct VaultClient {
    http: reqwest::Client,
    url: String,
    mount: String,
    client_token: String,
}

impl VaultClient {
    /// Log in with the userpass auth method.
    pub async fn login(
        http: reqwest::Client,
        settings: &VaultSettings,
        credentials: &VaultCredentials,
    ) -> Result<Self, ConfigError> {
        let url = settings.url.trim_end_matches('/').to_string();
        let login_url = format!("{}/v1/auth/userpass/login/{}", url, credentials.username);
        tracing::debug!("Vault POST {}", login_url);

        let resp = http
            .post(&login_url)
            .json(&json!({ "password": credentials.password }))
            .send()
            .await
            .map_err(|e| ConfigError::Vault(format!("login request failed: {}", e)))?;
        let resp = check_response(resp).await.map_err(|f| {
            ConfigError::Vault(format!("login rejected (HTTP {}): {}", f.status, f.body))
        })?;
        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ConfigError::Vault(format!("malformed login response: {}", e)))?;

        Ok(Self {
            http,
            url,
            mount: settings.mount.clone(),
            client_token: login.auth.client_token,
        })
    }

    /// Read the latest version of one secret.
    pub async fn read_secret(&self, name: &str) -> Result<SecretValue, ConfigError> {
        let url = format!("{}/v1/{}/data/{}", self.url, self.mount, name);
        tracing::debug!("Vault GET {}", url);

        let resp = self
            .http
            .get(&url)
            .header("X-Vault-Token", &self.client_token)
            .send()
            .await
            .map_err(|e| ConfigError::Vault(format!("read of `{}` failed: {}", name, e)))?;
        let resp = check_response(resp).await.map_err(|f| {
            ConfigError::Vault(format!(
                "read of `{}` rejected (HTTP {}): {}",
                name, f.status, f.body
            ))
        })?;
        let kv: KvResponse = resp.json().await.map_err(|e| {
            ConfigError::Vault(format!("malformed response for `{}`: {}", name, e))
        })?;

        Ok(SecretValue::from_data(kv.data.data))
    }
}

/// Log in with the bootstrap credentials and resolve every named secret.
pub async fn load_secrets(
    http: &reqwest::Client,
    settings: &VaultSettings,
    names: &[&str],
) -> Result<Secrets, ConfigError> {
    let credentials = VaultCredentials::read(&settings.credentials_path)?;
    let client = VaultClient::login(http.clone(), settings, &credentials).await?;
    tracing::info!("Logged in to vault as {}", credentials.username);

    let mut secrets = Secrets::default();
    for name in names {
        let value = client.read_secret(name).await?;
        secrets.insert(*name, value);
    }
    tracing::info!("Resolved {} secrets", names.len());
    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_credentials() {
        let creds = VaultCredentials::parse("vkotify:pa:ss\n").unwrap();
        assert_eq!(creds.username, "vkotify");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn test_parse_credentials_without_colon() {
        assert!(matches!(
            VaultCredentials::parse("justausername"),
            Err(ConfigError::BadCredentials)
        ));
        assert!(matches!(
            VaultCredentials::parse(":password"),
            Err(ConfigError::BadCredentials)
        ));
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/vkotify"))
            .and(body_json(json!({"password": "hunter2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "auth": {"client_token": "s.vault-token", "lease_duration": 3600}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn kv(data: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {"data": data, "metadata": {"version": 1}}
        }))
    }

    fn settings(server: &MockServer, dir: &tempfile::TempDir) -> VaultSettings {
        let credentials_path = dir.path().join("vkotify_vault");
        fs::write(&credentials_path, "vkotify:hunter2\n").unwrap();
        VaultSettings {
            url: server.uri(),
            credentials_path,
            mount: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_secrets() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/spotify_client_id"))
            .and(header("x-vault-token", "s.vault-token"))
            .respond_with(kv(json!({"value": "client-id"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/vk_fake_token"))
            .respond_with(kv(json!({"token": "t", "owner": "me"})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let secrets = load_secrets(
            &reqwest::Client::new(),
            &settings(&server, &dir),
            &["spotify_client_id", "vk_fake_token"],
        )
        .await
        .unwrap();

        assert_eq!(secrets.require("spotify_client_id").unwrap(), "client-id");
        assert!(matches!(
            secrets.get("vk_fake_token"),
            Some(SecretValue::Structured(m)) if m.len() == 2
        ));
    }

    #[tokio::test]
    async fn test_missing_secret_is_fatal() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = load_secrets(
            &reqwest::Client::new(),
            &settings(&server, &dir),
            &["spotify_client_secret"],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConfigError::Vault(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_rejected_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid username or password"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = load_secrets(&reqwest::Client::new(), &settings(&server, &dir), &[])
            .await
            .unwrap_err();
        match err {
            ConfigError::Vault(msg) => assert!(msg.contains("invalid username")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = VaultSettings {
            url: "http://127.0.0.1:1".to_string(),
            credentials_path: dir.path().join("absent"),
            mount: "secret".to_string(),
        };
        let err = load_secrets(&reqwest::Client::new(), &settings, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
