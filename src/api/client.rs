//! Shared HTTP plumbing for the vault, Spotify and VK clients

use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Non-2xx response, with whatever body the server sent
#[derive(Debug)]
pub struct HttpFailure {
    pub status: u16,
    pub body: String,
}

/// Build the one HTTP client used for every outbound call.
///
/// Every request gets the same bounded timeout so a hung connection
/// cannot stall the poll loop.
pub fn build_http(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Check HTTP response status code and return the body on failure.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, HttpFailure> {
    let status = resp.status();
    if !status.is_success() {
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!("HTTP {} for {}: {}", status.as_u16(), url, body);
        return Err(HttpFailure {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

/// Send an OAuth2 token request through the shared client, so token
/// exchanges get the same timeout and user agent as everything else.
pub async fn oauth_http_client(
    http: &reqwest::Client,
    request: oauth2::HttpRequest,
) -> Result<oauth2::HttpResponse, reqwest::Error> {
    let resp = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await?.to_vec();
    if !status_code.is_success() {
        tracing::debug!("HTTP {} for {}", status_code.as_u16(), request.url);
    }
    Ok(oauth2::HttpResponse {
        status_code,
        headers,
        body,
    })
}
