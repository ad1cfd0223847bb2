//! Authenticated JSON HTTP client shared by the store adapters.
//!
//! Every request carries the terminal's API key; transport and status
//! failures are mapped into the user-facing [`StoreError`] messages the
//! terminal shows verbatim.

use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::info;

use crate::config::BackendConfig;
use crate::error::StoreError;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout used specifically for the lightweight connectivity test.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Convert a `reqwest::Error` into the matching [`StoreError`].
pub(crate) fn friendly_error(url: &str, err: &reqwest::Error) -> StoreError {
    if err.is_connect() {
        return StoreError::Unreachable(url.to_string());
    }
    if err.is_timeout() {
        return StoreError::Timeout(url.to_string());
    }
    if err.is_builder() {
        return StoreError::Config(format!("Invalid backend URL: {url}"));
    }
    StoreError::Network {
        url: url.to_string(),
        detail: err.to_string(),
    }
}

/// User-facing message for a non-success HTTP status.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Terminal not authorized".to_string(),
        404 => "Backend endpoint not found".to_string(),
        s if s >= 500 => "Backend server error".to_string(),
        _ => "Unexpected response from backend".to_string(),
    }
}

/// Build a [`StoreError::Rejected`], mining the response body for the
/// backend's own error message when it sent one.
pub(crate) fn rejection(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .or_else(|| json.get("message"))
                .or_else(|| json.get("detail"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| status_message(status));
    StoreError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Result of a connectivity test.
#[derive(Debug, serde::Serialize)]
pub struct ConnectivityResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Authenticated client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: BackendConfig,
    client: Client,
}

impl ApiClient {
    pub fn new(config: BackendConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Perform an authenticated request. `path` includes the leading slash,
    /// e.g. `/fetch-all-items`. Empty 2xx bodies come back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, StoreError> {
        let full_url = format!("{}{}", self.config.base_url, path);

        let mut req = self
            .client
            .request(method, &full_url)
            .header("X-POS-API-Key", &self.config.api_key)
            .header("Content-Type", "application/json");
        if let Some(terminal_id) = &self.config.terminal_id {
            req = req.header("x-terminal-id", terminal_id);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.config.base_url, &e))?;
        let status = resp.status();

        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(rejection(status, &body_text));
        }

        let body_text = resp.text().await.unwrap_or_default();
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| StoreError::InvalidResponse(format!("backend sent invalid JSON: {e}")))
    }

    pub async fn get(&self, path: &str) -> Result<Value, StoreError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, StoreError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Probe the backend with a lightweight health check.
    pub async fn test_connectivity(&self) -> ConnectivityResult {
        let health_url = format!("{}/health", self.config.base_url);
        let client = match Client::builder().timeout(CONNECTIVITY_TIMEOUT).build() {
            Ok(c) => c,
            Err(e) => {
                return ConnectivityResult {
                    success: false,
                    latency_ms: None,
                    error: Some(format!("Failed to create HTTP client: {e}")),
                };
            }
        };

        let start = Instant::now();
        let resp = match client
            .get(&health_url)
            .header("X-POS-API-Key", &self.config.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return ConnectivityResult {
                    success: false,
                    latency_ms: None,
                    error: Some(friendly_error(&self.config.base_url, &e).to_string()),
                };
            }
        };

        let latency = start.elapsed().as_millis() as u64;
        if resp.status().is_success() {
            info!(latency_ms = latency, "connectivity test passed");
            ConnectivityResult {
                success: true,
                latency_ms: Some(latency),
                error: None,
            }
        } else {
            ConnectivityResult {
                success: false,
                latency_ms: Some(latency),
                error: Some(rejection(resp.status(), "").to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_backend_message() {
        let err = rejection(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "Item ID is required"}"#,
        );
        assert_eq!(err.to_string(), "Item ID is required (HTTP 422)");

        let err = rejection(StatusCode::BAD_REQUEST, r#"{"error": "bad payload"}"#);
        assert_eq!(err.to_string(), "bad payload (HTTP 400)");
    }

    #[test]
    fn rejection_falls_back_to_status_table() {
        assert_eq!(
            rejection(StatusCode::UNAUTHORIZED, "").to_string(),
            "API key is invalid or expired (HTTP 401)"
        );
        assert_eq!(
            rejection(StatusCode::FORBIDDEN, "not json").to_string(),
            "Terminal not authorized (HTTP 403)"
        );
        assert_eq!(
            rejection(StatusCode::BAD_GATEWAY, "").to_string(),
            "Backend server error (HTTP 502)"
        );
    }
}
