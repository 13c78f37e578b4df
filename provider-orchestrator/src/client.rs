//! Orchestration backend client
//!
//! Issues `POST /process-file` and classifies the outcome in a fixed order:
//!
//! 1. no response → [`OrchestrationError::Transport`]
//! 2. non-2xx → [`OrchestrationError::Server`] (401 is always
//!    [`ServerError::AuthenticationExpired`])
//! 3. 2xx with an empty or unreadable body → [`OrchestrationError::Decode`]
//! 4. otherwise the decoded [`OrchestrationResult`], soft error included

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::{join_url, ScoutConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::decoder::decode_orchestration_result;
use crate::error::{OrchestrationError, Result, ServerError};
use crate::types::{OrchestrationResult, ProcessFileRequest, ServiceMessage};

pub const PROCESS_FILE_PATH: &str = "/process-file";

const ROOT_PATH: &str = "/";

/// Client for the orchestration backend.
///
/// Every call is a single attempt. The client holds no session state: the
/// backend keeps the Google Drive session itself, so no bearer header is
/// attached.
///
/// # Example
///
/// ```ignore
/// use provider_orchestrator::OrchestrationClient;
///
/// let client = OrchestrationClient::new(http_client, "http://localhost:8000", timeout);
/// let result = client.process_file("1AbC", "rename by invoice date").await?;
/// if let Some(message) = result.soft_error() {
///     eprintln!("backend reported: {}", message);
/// }
/// ```
pub struct OrchestrationClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl OrchestrationClient {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ScoutConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(
            http_client,
            config.backend_base_url.clone(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a file for processing.
    ///
    /// `file_id` is the opaque Drive file identifier; `instruction` is free
    /// text passed to the backend as `task_prompt`.
    #[instrument(skip(self, instruction), fields(file_id = %file_id))]
    pub async fn process_file(&self, file_id: &str, instruction: &str) -> Result<OrchestrationResult> {
        let url = join_url(&self.base_url, PROCESS_FILE_PATH);
        let request = HttpRequest::post(url)
            .accept_json()
            .timeout(self.timeout)
            .json(&ProcessFileRequest::new(file_id, instruction))
            .map_err(|e| OrchestrationError::InvalidRequest(e.to_string()))?;

        info!("Submitting file for processing");
        let response = self.send(request).await?;
        if !response.has_body() {
            warn!(status = response.status, "Processing response had no body");
            return Err(OrchestrationError::Decode("empty response body".to_string()));
        }

        let result = decode_orchestration_result(&response.body).map_err(|e| {
            warn!(error = %e, body_len = response.body.len(), "Undecodable processing response");
            e
        })?;

        match result.soft_error() {
            Some(message) => warn!(soft_error = message, "Backend reported a processing error"),
            None => info!(
                status_updates = result.status_updates.len(),
                "File processed"
            ),
        }

        Ok(result)
    }

    /// `GET /` connectivity check.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<ServiceMessage> {
        let request = HttpRequest::get(join_url(&self.base_url, ROOT_PATH))
            .accept_json()
            .timeout(self.timeout);

        let response = self.send(request).await?;

        let message: ServiceMessage = response
            .json()
            .map_err(|e| OrchestrationError::Decode(e.to_string()))?;
        debug!(message = %message.message, "Backend reachable");
        Ok(message)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Request failed without a response");
            OrchestrationError::Transport(e.to_string())
        })?;

        if !response.is_success() {
            let error = ServerError::from_response(&response);
            warn!(status = response.status, error = %error, "Backend returned an error");
            return Err(error.into());
        }

        debug!(status = response.status, "Backend responded");
        Ok(response)
    }
}

impl std::fmt::Debug for OrchestrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AUTHENTICATION_EXPIRED_MESSAGE;
    use crate::types::FileReference;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpMethod;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    fn client(mock_http: MockHttpClient) -> OrchestrationClient {
        OrchestrationClient::new(
            Arc::new(mock_http),
            "http://localhost:8000/",
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_process_file_request_shape() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap();
                request.method == HttpMethod::Post
                    && request.url == "http://localhost:8000/process-file"
                    && request.headers.get("Content-Type").map(String::as_str)
                        == Some("application/json")
                    && !request.headers.contains_key("Authorization")
                    && request.timeout == Some(Duration::from_secs(30))
                    && body == serde_json::json!({"file_name": "F1", "task_prompt": "rename"})
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"original_file":"F1","status_updates":[]}"#)));

        let result = client(mock_http).process_file("F1", "rename").await.unwrap();

        assert_eq!(result.original_file, FileReference::from_identifier("F1"));
    }

    #[tokio::test]
    async fn test_401_is_authentication_expired() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(401, r#"{"detail":"Not authenticated with Google Drive"}"#)));

        let err = client(mock_http).process_file("F1", "rename").await.unwrap_err();

        assert_eq!(err, OrchestrationError::Server(ServerError::AuthenticationExpired));
        assert_eq!(err.user_message(), AUTHENTICATION_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_server_error_uses_detail() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(500, r#"{"detail":"Orchestrator failed"}"#)));

        let err = client(mock_http).process_file("F1", "rename").await.unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.user_message(), "Orchestrator failed");
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".to_string())));

        let err = client(mock_http).process_file("F1", "rename").await.unwrap_err();

        assert!(matches!(err, OrchestrationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_empty_2xx_body_is_decode_error() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(204, "")));

        let err = client(mock_http).process_file("F1", "rename").await.unwrap_err();

        assert!(matches!(err, OrchestrationError::Decode(_)));
    }

    #[tokio::test]
    async fn test_soft_error_still_succeeds() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                200,
                r#"{"original_file":"F1","status_updates":["read"],"error_message":"disk full"}"#,
            ))
        });

        let result = client(mock_http).process_file("F1", "rename").await.unwrap();

        assert_eq!(result.error_message.as_deref(), Some("disk full"));
        assert_eq!(result.status_updates, vec!["read"]);
    }

    #[tokio::test]
    async fn test_ping() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Get && request.url == "http://localhost:8000/"
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"message":"Hello World!"}"#)));

        let message = client(mock_http).ping().await.unwrap();

        assert_eq!(message.message, "Hello World!");
    }
}
