//! Dunya API client
//!
//! Token-authenticated HTTP transport. The token belongs to the client
//! instance; two clients with different tokens can coexist in one process.

use crate::error::{DunyaError, Result};
use crate::query::{QueryParams, RemoteQuery};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Dunya API base URL
pub const DUNYA_BASE_URL: &str = "https://dunya.compmusic.upf.edu/";

/// Default timeout for Dunya requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header
const USER_AGENT: &str = concat!("compmir/", env!("CARGO_PKG_VERSION"));

/// Dunya HTTP client
pub struct DunyaClient {
    http_client: Client,
    base_url: String,
}

impl DunyaClient {
    /// Create a client for the public Dunya server
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, DUNYA_BASE_URL)
    }

    /// Create a client for a Dunya server at `base_url`
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let mut auth = header::HeaderValue::from_str(&format!("Token {}", token.trim()))
            .map_err(|e| DunyaError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| DunyaError::Network(e.to_string()))?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET and map non-success statuses to errors
    async fn get(&self, path: &str, params: QueryParams<'_>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));

        debug!(url = %url, params = ?params, "Querying Dunya API");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| DunyaError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DunyaError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(DunyaError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DunyaError::Api(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl RemoteQuery for DunyaClient {
    async fn query_json(&self, path: &str, params: QueryParams<'_>) -> Result<Value> {
        self.get(path, params)
            .await?
            .json()
            .await
            .map_err(|e| DunyaError::Parse(format!("{}: {}", path, e)))
    }

    async fn query_bytes(&self, path: &str, params: QueryParams<'_>) -> Result<Vec<u8>> {
        let body = self
            .get(path, params)
            .await?
            .bytes()
            .await
            .map_err(|e| DunyaError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DunyaClient::new("abc123");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), DUNYA_BASE_URL);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = DunyaClient::with_base_url("abc123", "http://localhost:8000").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/");
    }

    #[test]
    fn test_token_with_control_characters_is_rejected() {
        let result = DunyaClient::new("bad\ntoken");
        assert!(matches!(result, Err(DunyaError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is closed on test machines
        let client = DunyaClient::with_base_url("abc123", "http://127.0.0.1:9").unwrap();
        let result = client.query_json("document/dunya-carnatic", &[]).await;
        assert!(matches!(result, Err(DunyaError::Network(_))));
    }
}
