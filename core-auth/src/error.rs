use thiserror::Error;

/// Failures of the browser sign-in flow and credential persistence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user dismissed the browser session. Not a fault.
    #[error("Sign-in was cancelled")]
    Cancelled,

    /// The browser session could not be presented at all.
    #[error("Could not start the sign-in session: {0}")]
    SessionFailedToStart(String),

    /// The browser session ended abnormally after it was shown.
    #[error("Sign-in session failed: {0}")]
    SessionFailed(String),

    /// The redirect carried neither a `token` nor `status=success`.
    #[error("Sign-in callback was malformed: {reason}")]
    CallbackMalformed { reason: String },

    #[error("A sign-in is already in progress")]
    SignInInProgress,

    #[error("Sign-in timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Invalid sign-in configuration: {0}")]
    InvalidConfiguration(String),
}

impl AuthError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }

    /// Whether the user can reasonably just try again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AuthError::SecureStorageUnavailable(_) | AuthError::InvalidConfiguration(_)
        )
    }

    /// Single human-readable line for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Cancelled => "Sign-in was cancelled.".to_string(),
            AuthError::SessionFailedToStart(_) => {
                "Could not open the sign-in page. Please try again.".to_string()
            }
            AuthError::SessionFailed(reason) => format!("Authentication failed: {}", reason),
            AuthError::CallbackMalformed { .. } => {
                "Could not extract authentication token from the sign-in response.".to_string()
            }
            AuthError::SignInInProgress => "A sign-in is already in progress.".to_string(),
            AuthError::Timeout { .. } => "Sign-in took too long. Please try again.".to_string(),
            AuthError::SecureStorageUnavailable(_) => {
                "Could not access secure storage to save your sign-in.".to_string()
            }
            AuthError::InvalidConfiguration(reason) => {
                format!("Sign-in is misconfigured: {}", reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancellation() {
        assert!(AuthError::Cancelled.is_cancellation());
        assert!(!AuthError::SessionFailedToStart("no window".into()).is_cancellation());
        assert!(!AuthError::CallbackMalformed {
            reason: "no token".into()
        }
        .is_cancellation());
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = [
            AuthError::Cancelled,
            AuthError::SessionFailedToStart("x".into()),
            AuthError::CallbackMalformed { reason: "x".into() },
            AuthError::SecureStorageUnavailable("x".into()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(AuthError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_recoverability() {
        assert!(AuthError::Timeout { seconds: 120 }.is_recoverable());
        assert!(!AuthError::SecureStorageUnavailable("locked".into()).is_recoverable());
    }
}
