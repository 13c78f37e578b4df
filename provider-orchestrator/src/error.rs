//! Error types for the orchestration provider

use bridge_traits::http::HttpResponse;
use serde::Deserialize;
use thiserror::Error;

/// Shown for any 401, whatever the body says.
pub const AUTHENTICATION_EXPIRED_MESSAGE: &str =
    "Authentication failed or token expired. Please authenticate again.";

/// Non-2xx response from the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// 401 Unauthorized
    #[error("{}", AUTHENTICATION_EXPIRED_MESSAGE)]
    AuthenticationExpired,

    #[error("Server error (status {status_code}): {message}")]
    Status { status_code: u16, message: String },
}

impl ServerError {
    /// Classify a non-2xx response.
    ///
    /// Message precedence: a JSON `detail` string, a JSON `detail` list of
    /// validation errors, the raw body text, then `status N`.
    /// A body that is not UTF-8 counts as no body.
    pub fn from_response(response: &HttpResponse) -> Self {
        if response.is_unauthorized() {
            return ServerError::AuthenticationExpired;
        }

        let message = detail_message(&response.body)
            .or_else(|| {
                let text = response.text().ok()?;
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            })
            .unwrap_or_else(|| format!("status {}", response.status));

        ServerError::Status {
            status_code: response.status,
            message,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::AuthenticationExpired => 401,
            ServerError::Status { status_code, .. } => *status_code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServerError::AuthenticationExpired => AUTHENTICATION_EXPIRED_MESSAGE,
            ServerError::Status { message, .. } => message,
        }
    }

    pub fn is_authentication_expired(&self) -> bool {
        matches!(self, ServerError::AuthenticationExpired)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

#[derive(Deserialize)]
struct ValidationIssue {
    msg: String,
}

fn detail_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    let message = match parsed.detail {
        Detail::Message(message) => message,
        Detail::Validation(issues) => issues
            .into_iter()
            .map(|issue| issue.msg)
            .collect::<Vec<_>>()
            .join("; "),
    };
    (!message.trim().is_empty()).then_some(message)
}

/// Orchestration errors. Each aborts the call.
///
/// A backend-reported `error_message` on a 2xx response is not an error; see
/// [`crate::OrchestrationResult::soft_error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    /// No HTTP response was obtained
    #[error("Network error: {0}")]
    Transport(String),

    #[error(transparent)]
    Server(#[from] ServerError),

    /// 2xx with a body that is empty or not the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OrchestrationError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OrchestrationError::Server(error) => Some(error.status_code()),
            _ => None,
        }
    }

    pub fn is_authentication_expired(&self) -> bool {
        matches!(self, OrchestrationError::Server(e) if e.is_authentication_expired())
    }

    /// Single human-readable message for the UI.
    pub fn user_message(&self) -> String {
        match self {
            OrchestrationError::Transport(_) => {
                "Could not reach the processing service. Check your connection and try again."
                    .to_string()
            }
            OrchestrationError::Server(error) => error.message().to_string(),
            OrchestrationError::Decode(_) => {
                "The processing service returned a response that could not be read.".to_string()
            }
            OrchestrationError::InvalidRequest(reason) => {
                format!("The request could not be sent: {}", reason)
            }
        }
    }
}

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: u16, body: &'static [u8]) -> ServerError {
        ServerError::from_response(&HttpResponse::new(status, body))
    }

    #[test]
    fn test_401_ignores_body() {
        let bodies: [&'static [u8]; 3] = [br#"{"detail":"Token revoked"}"#, b"nope", b""];
        for body in bodies {
            let error = classify(401, body);
            assert_eq!(error, ServerError::AuthenticationExpired);
            assert_eq!(error.message(), AUTHENTICATION_EXPIRED_MESSAGE);
            assert_eq!(error.status_code(), 401);
        }
    }

    #[test]
    fn test_detail_string() {
        let error = classify(500, br#"{"detail":"Orchestrator crashed"}"#);
        assert_eq!(
            error,
            ServerError::Status {
                status_code: 500,
                message: "Orchestrator crashed".to_string()
            }
        );
    }

    #[test]
    fn test_detail_validation_list() {
        let body = br#"{"detail":[
            {"loc":["body","file_name"],"msg":"field required","type":"value_error.missing"},
            {"loc":["body","task_prompt"],"msg":"field required","type":"value_error.missing"}
        ]}"#;
        let error = classify(422, body);
        assert_eq!(error.message(), "field required; field required");
    }

    #[test]
    fn test_raw_text_then_generic() {
        assert_eq!(
            classify(502, b"Bad Gateway\n").message(),
            "Bad Gateway"
        );
        assert_eq!(classify(503, b"").message(), "status 503");
        assert_eq!(
            classify(500, br#"{"detail":""}"#).message(),
            r#"{"detail":""}"#
        );
        assert_eq!(classify(500, &[0xff, 0xfe]).message(), "status 500");
    }

    #[test]
    fn test_error_display() {
        let error: OrchestrationError = ServerError::Status {
            status_code: 404,
            message: "Not Found".to_string(),
        }
        .into();

        assert_eq!(error.to_string(), "Server error (status 404): Not Found");
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.user_message(), "Not Found");
        assert!(!error.is_authentication_expired());
    }

    #[test]
    fn test_transport_has_no_status() {
        let error = OrchestrationError::Transport("connection refused".to_string());
        assert_eq!(error.status_code(), None);
        assert!(error.user_message().contains("Could not reach"));
    }
}
