use core_auth::AuthError;
use provider_orchestrator::OrchestrationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Processing error: {0}")]
    Processing(#[from] OrchestrationError),
}

impl From<core_runtime::Error> for CoreError {
    fn from(error: core_runtime::Error) -> Self {
        match error {
            core_runtime::Error::Config(message) => CoreError::Configuration(message),
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            core_runtime::Error::Internal(message) => CoreError::InitializationFailed(message),
        }
    }
}

impl CoreError {
    /// The user dismissed the sign-in browser.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CoreError::Auth(e) if e.is_cancellation())
    }

    /// The backend rejected the session; the UI should offer sign-in again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, CoreError::Processing(e) if e.is_authentication_expired())
    }

    /// One human-readable message per error.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Auth(error) => error.user_message(),
            CoreError::Processing(error) => error.user_message(),
            CoreError::CapabilityMissing { capability, .. } => {
                format!("This app is missing a required component ({}).", capability)
            }
            CoreError::Configuration(message) => format!("Configuration problem: {}", message),
            CoreError::InitializationFailed(_) | CoreError::RuntimeUnavailable(_) => {
                "The app could not start its background services.".to_string()
            }
        }
    }

    /// Message for an error banner, or `None` when nothing should be shown.
    pub fn banner_message(&self) -> Option<String> {
        if self.is_cancellation() {
            None
        } else {
            Some(self.user_message())
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
