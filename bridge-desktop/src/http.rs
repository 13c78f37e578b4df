//! `HttpClient` over reqwest with rustls.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_USER_AGENT: &str = concat!("scout-client/", env!("CARGO_PKG_VERSION"));

/// Desktop HTTP transport. One attempt per request, no redirects beyond
/// reqwest's defaults, and every response returned whatever its status.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::try_with_timeout(DEFAULT_TIMEOUT).unwrap_or_else(|e| {
            warn!(error = %e, "Tuned reqwest client rejected; using defaults");
            Self::with_client(Client::new())
        })
    }

    pub fn try_with_timeout(timeout: Duration) -> Result<Self> {
        Self::try_with_settings(timeout, DEFAULT_USER_AGENT)
    }

    /// Overall request `timeout` (a per-request timeout still wins) and the
    /// `User-Agent` header sent with every call.
    pub fn try_with_settings(timeout: Duration, user_agent: &str) -> Result<Self> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map(Self::with_client)
            .map_err(|e| BridgeError::NotAvailable(format!("Cannot build HTTP client: {}", e)))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn prepare(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = request
            .headers
            .into_iter()
            .fold(self.client.request(method, &request.url), |builder, (name, value)| {
                builder.header(name, value)
            });

        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> BridgeError {
    let reason = if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        format!("Could not connect: {}", e)
    } else {
        e.to_string()
    };
    BridgeError::OperationFailed(reason)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending request");

        let response = self.prepare(request).send().await.map_err(|e| {
            warn!(error = %e, "No response received");
            transport_error(e)
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Response body cut short: {}", e)))?;

        debug!(status, bytes = body.len(), "Response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        assert!(ReqwestHttpClient::try_with_timeout(Duration::from_secs(5)).is_ok());
        assert!(ReqwestHttpClient::try_with_settings(Duration::from_secs(5), "scout-test/1").is_ok());
        let _client = ReqwestHttpClient::default();
    }

    #[test]
    fn test_request_carries_method_headers_and_timeout() {
        let client = ReqwestHttpClient::new();
        let request = client
            .prepare(
                HttpRequest::post("http://localhost:8000/process-file")
                    .accept_json()
                    .timeout(Duration::from_secs(3))
                    .body("{}"),
            )
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.headers()["accept"], "application/json");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(3)));
    }

    #[test]
    fn test_default_user_agent_names_client() {
        assert!(DEFAULT_USER_AGENT.starts_with("scout-client/"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_operation_failure() {
        let client = ReqwestHttpClient::try_with_timeout(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on loopback is closed on typical hosts.
        let err = client
            .execute(HttpRequest::get("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }
}
