//! Core types for the sign-in flow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque access credential issued by the backend.
///
/// Never empty. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// Two-valued state observed by the UI. `Authenticated` iff a non-empty
/// credential is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// Lifecycle of one browser sign-in attempt.
///
/// `Idle -> AwaitingCallback -> {Authenticated, Failed, Cancelled}`; a terminal
/// state returns to `AwaitingCallback` when a new attempt starts and to `Idle`
/// on sign-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlowState {
    #[default]
    Idle,
    AwaitingCallback,
    Authenticated,
    Failed,
    Cancelled,
}

impl AuthFlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuthFlowState::Authenticated | AuthFlowState::Failed | AuthFlowState::Cancelled
        )
    }
}

/// What an accepted callback carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// `token=<credential>`
    Token(Credential),
    /// `status=success` with no token; the backend holds the session.
    SessionEstablished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_empty() {
        assert!(Credential::new("").is_none());
        assert_eq!(Credential::new("abc").unwrap().expose(), "abc");
    }

    #[test]
    fn test_credential_debug_redacts() {
        let credential = Credential::new("ya29.secret_value").unwrap();
        let debug_str = format!("{:?}", credential);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("ya29"));
    }

    #[test]
    fn test_states_default() {
        assert_eq!(AuthState::default(), AuthState::Unauthenticated);
        assert_eq!(AuthFlowState::default(), AuthFlowState::Idle);
        assert!(!AuthFlowState::AwaitingCallback.is_terminal());
        assert!(AuthFlowState::Cancelled.is_terminal());
    }

    #[test]
    fn test_auth_state_serialization() {
        assert_eq!(
            serde_json::to_string(&AuthState::Authenticated).unwrap(),
            "\"authenticated\""
        );
        assert_eq!(
            serde_json::to_string(&AuthFlowState::AwaitingCallback).unwrap(),
            "\"awaiting_callback\""
        );
    }
}
