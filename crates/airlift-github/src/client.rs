//! Authenticated GitHub REST client

use reqwest::{Client, Method, Response, StatusCode};
use tracing::debug;

use crate::error::{HubError, Result};

const API_BASE: &str = "https://api.github.com";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("airlift/", env!("CARGO_PKG_VERSION"));

/// GitHub control-plane client authenticating with a personal access token.
///
/// All error mapping happens here, once, at the API boundary: callers see
/// the closed [`HubError`] taxonomy and never raw status codes.
pub struct HubClient {
    client: Client,
    token: String,
    api_base: String,
}

impl HubClient {
    /// Create a client with the given personal access token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Create a client from the `GITHUB_TOKEN` environment variable
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .map_err(|_| HubError::AuthenticationFailed("GITHUB_TOKEN not set".to_string()))?;
        if token.trim().is_empty() {
            return Err(HubError::AuthenticationFailed(
                "GITHUB_TOKEN is empty".to_string(),
            ));
        }
        Ok(Self::new(token))
    }

    /// Override the API base URL (used by tests against a local server)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.api_base
    }

    /// Issue an authenticated request and map error statuses
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!(%method, %url, "GitHub API request");

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", ACCEPT_HEADER)
            .header("User-Agent", USER_AGENT);

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(map_error(status, message))
    }

    /// Issue a request and deserialize the JSON response body
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T> {
        let response = self.send(Method::GET, endpoint, None).await?;
        Ok(response.json().await?)
    }

    /// Download raw bytes from an absolute URL with authentication.
    /// Used for log bundles and release assets, which redirect to storage.
    pub(crate) async fn get_absolute(&self, url: &str) -> Result<Response> {
        debug!(%url, "GitHub download request");
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(map_error(status, message))
    }
}

/// Map a non-success status to the closed error taxonomy
fn map_error(status: StatusCode, message: String) -> HubError {
    match status {
        StatusCode::UNAUTHORIZED => HubError::AuthenticationFailed(trim_message(&message)),
        StatusCode::FORBIDDEN => {
            if message.contains("rate limit") {
                HubError::RateLimited
            } else {
                HubError::AuthenticationFailed(trim_message(&message))
            }
        }
        StatusCode::TOO_MANY_REQUESTS => HubError::RateLimited,
        StatusCode::NOT_FOUND => HubError::NotFound(trim_message(&message)),
        _ => HubError::ApiError {
            status: status.as_u16(),
            message: trim_message(&message),
        },
    }
}

fn trim_message(message: &str) -> String {
    // API error bodies are JSON like {"message": "...", ...}; keep it short
    serde_json::from_str::<serde_json::Value>(message)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            let trimmed = message.trim();
            if trimmed.len() > 200 {
                // Cut on a char boundary; bodies are arbitrary bytes
                let cut = trimmed
                    .char_indices()
                    .map(|(i, _)| i)
                    .take_while(|&i| i <= 200)
                    .last()
                    .unwrap_or(0);
                format!("{}...", &trimmed[..cut])
            } else {
                trimmed.to_string()
            }
        })
}
