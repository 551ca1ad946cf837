//! VK `status.set`

use async_trait::async_trait;
use serde::Deserialize;

use super::client::check_response;
use super::StatusSink;
use crate::config::VkSettings;
use crate::error::PublishError;

/// VK wraps API failures in a 200 response
#[derive(Debug, Deserialize)]
struct VkReply {
    error: Option<VkError>,
}

#[derive(Debug, Deserialize)]
struct VkError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// Publishes the status with a static, non-expiring access token
pub struct VkStatus {
    http: reqwest::Client,
    api_base: String,
    api_version: String,
    access_token: String,
}

impl VkStatus {
    pub fn new(http: reqwest::Client, settings: &VkSettings, access_token: &str) -> Self {
        Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl StatusSink for VkStatus {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        let url = format!("{}/status.set", self.api_base);
        tracing::debug!("VK POST {}", url);

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("access_token", self.access_token.as_str()),
                ("v", self.api_version.as_str()),
                ("text", text),
            ])
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let body = resp.bytes().await?;
        let reply: VkReply =
            serde_json::from_slice(&body).map_err(|e| PublishError::Malformed(e.to_string()))?;
        if let Some(err) = reply.error {
            return Err(PublishError::Api {
                code: err.error_code,
                message: err.error_msg,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink(server: &MockServer) -> VkStatus {
        let settings = VkSettings {
            api_base: format!("{}/method", server.uri()),
            api_version: "5.124".to_string(),
        };
        VkStatus::new(reqwest::Client::new(), &settings, "vk-token")
    }

    #[tokio::test]
    async fn test_publish_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/method/status.set"))
            .and(body_string_contains("access_token=vk-token"))
            .and(body_string_contains("v=5.124"))
            .and(body_string_contains("text=Now%3A+Bar+-+Foo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": 1})))
            .expect(1)
            .mount(&server)
            .await;

        assert_ok!(sink(&server).publish("Now: Bar - Foo").await);
    }

    #[tokio::test]
    async fn test_api_error_in_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"error_code": 5, "error_msg": "User authorization failed"}
            })))
            .mount(&server)
            .await;

        let err = sink(&server).publish("x").await.unwrap_err();
        match err {
            PublishError::Api { code, message } => {
                assert_eq!(code, 5);
                assert_eq!(message, "User authorization failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = sink(&server).publish("x").await.unwrap_err();
        assert!(
            matches!(err, PublishError::Http { status: 502, .. }),
            "got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_empty_status_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("text="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": 1})))
            .expect(1)
            .mount(&server)
            .await;

        assert_ok!(sink(&server).publish("").await);
    }
}
