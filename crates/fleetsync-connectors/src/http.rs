//! HTTP utilities for connectors.
//!
//! A thin wrapper over `reqwest` shared by both connectors. Every request
//! is issued exactly once: a failed call is surfaced to the caller, which
//! decides whether the failure is fatal for the run or scoped to one asset.
//! There is no retry, no rate limiting, and no response caching.

use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Single-attempt HTTP client built from a connector configuration.
pub struct HttpClient {
    client: Client,
    config: ConnectorConfig,
}

impl HttpClient {
    /// Creates a new HTTP client from connector configuration.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, val);
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Executes a GET request.
    pub async fn get(&self, path: &str) -> ConnectorResult<Response> {
        let url = self.build_url(path);
        self.execute(self.client.get(&url)).await
    }

    /// Executes a GET request and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConnectorResult<T> {
        let response = self.get(path).await?;
        self.parse_json_response(response).await
    }

    /// Executes a POST request with a JSON body.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<Response> {
        let url = self.build_url(path);
        self.execute(self.client.post(&url).json(body)).await
    }

    /// Executes a POST request and deserializes the JSON response.
    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<R> {
        let response = self.post(path, body).await?;
        self.parse_json_response(response).await
    }

    /// Executes a PUT request with a JSON body.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<Response> {
        let url = self.build_url(path);
        self.execute(self.client.put(&url).json(body)).await
    }

    /// Parses a JSON response body.
    async fn parse_json_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> ConnectorResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            ConnectorError::InvalidResponse(format!(
                "Failed to parse response (status {}): {} - Body: {}",
                status,
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Executes a request once with authentication and status mapping.
    ///
    /// Non-2xx responses become errors; callers that need the raw status
    /// (e.g., to log a write failure and continue) get it from the error
    /// message, not from the response.
    async fn execute(&self, mut request: reqwest::RequestBuilder) -> ConnectorResult<Response> {
        request = self.add_auth(request);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ConnectorError::Timeout(e.to_string())
            } else if e.is_connect() {
                ConnectorError::ConnectionFailed(e.to_string())
            } else {
                ConnectorError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                ConnectorError::AuthenticationFailed(format!("status {}", status)),
            ),
            StatusCode::NOT_FOUND => Err(ConnectorError::NotFound("Resource not found".into())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ConnectorError::RequestFailed(format!(
                    "status {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                )))
            }
        }
    }

    /// Adds authentication to a request.
    fn add_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::ApiKey { key, header_name } => {
                request.header(header_name, key.expose_secret())
            }
            AuthConfig::Cookie { value } => request.header("Cookie", value.expose_secret()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config() -> ConnectorConfig {
        ConnectorConfig {
            name: "test".to_string(),
            base_url: "https://api.example.com".to_string(),
            auth: AuthConfig::None,
            timeout_secs: 30,
            headers: HashMap::new(),
        }
    }

    #[test]
    fn test_build_url() {
        let client = HttpClient::new(test_config()).unwrap();

        assert_eq!(
            client.build_url("/api/entities/def/Assets"),
            "https://api.example.com/api/entities/def/Assets"
        );
        assert_eq!(
            client.build_url("v2/vehicle_locations"),
            "https://api.example.com/v2/vehicle_locations"
        );
    }

    #[test]
    fn test_build_url_trailing_slash() {
        let mut config = test_config();
        config.base_url = "https://api.example.com/".to_string();
        let client = HttpClient::new(config).unwrap();

        assert_eq!(client.build_url("/path"), "https://api.example.com/path");
    }
}
