//! # Authentication Module
//!
//! Browser-based sign-in against the orchestration backend and persistence
//! of the resulting credential.
//!
//! ## Overview
//!
//! The backend hosts the Google authorization page. The client opens
//! `<backend>/auth/google?callback_scheme=<scheme>` in the system browser and
//! waits for the redirect back to `<scheme>://...`. The redirect carries
//! either `token=<T>` or `status=success`.
//!
//! ## Components
//!
//! - [`CredentialStore`] - one credential under one fixed key
//! - [`AuthenticationFlowController`] - drives the browser session and owns
//!   the observable auth state
//! - [`parse_callback`] / [`build_authorization_url`] - the URL contract

pub mod callback;
pub mod controller;
pub mod credential_store;
pub mod error;
pub mod types;

pub use callback::{build_authorization_url, parse_callback};
pub use controller::{AuthConfig, AuthenticationFlowController};
pub use credential_store::CredentialStore;
pub use error::{AuthError, Result};
pub use types::{AuthFlowState, AuthState, CallbackOutcome, Credential};
