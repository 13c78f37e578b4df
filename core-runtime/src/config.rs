//! # Core Configuration Module
//!
//! Provides configuration management for the Scout client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`ScoutConfig`] holding the backend endpoint, auth parameters and every host
//! bridge the core needs. It validates eagerly so a misconfigured host fails
//! at startup instead of on the first sign-in attempt.
//!
//! ## Backend URL Resolution
//!
//! 1. A non-empty manual override (builder `.backend_url()` or the
//!    `SCOUT_BACKEND_URL` environment variable via `.with_env_overrides()`)
//! 2. The default for the detected [`Environment`]:
//!    - Development: `http://localhost:8000`
//!    - Production: `https://your-production-domain.com`
//!
//! ## Required Dependencies
//!
//! - `SecureStore` - credential persistence (desktop default: OS keyring)
//!
//! ## Optional Dependencies
//!
//! - `HttpClient` - orchestration requests
//! - `WebAuthSession` - browser sign-in
//! - `UiDispatcher` - UI-affinity delivery
//!
//! The service facade refuses to start without the optional bridges; they are
//! optional here so that diagnostics can build a config without them.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ScoutConfig;
//! use std::sync::Arc;
//!
//! let config = ScoutConfig::builder()
//!     .with_env_overrides()
//!     .http_client(Arc::new(ReqwestHttpClient::new()))
//!     .web_auth_session(Arc::new(SystemBrowserAuthSession::new()))
//!     .ui_dispatcher(Arc::new(dispatcher))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SecureStore, UiDispatcher, WebAuthSession};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEVELOPMENT_BACKEND_URL: &str = "http://localhost:8000";
pub const PRODUCTION_BACKEND_URL: &str = "https://your-production-domain.com";
pub const DEFAULT_CALLBACK_SCHEME: &str = "scoutapp";
pub const DEFAULT_CREDENTIAL_KEY: &str = "googleDriveAccessToken";
pub const DEFAULT_SESSION_PLACEHOLDER: &str = "session_active";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable consulted by [`ScoutConfigBuilder::with_env_overrides`].
pub const BACKEND_URL_ENV: &str = "SCOUT_BACKEND_URL";

/// Deployment environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Development for debug builds, Production for release builds.
    pub fn detect() -> Self {
        if cfg!(debug_assertions) {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    pub fn default_backend_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BACKEND_URL,
            Environment::Production => PRODUCTION_BACKEND_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

/// Diagnostic snapshot of the effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInfo {
    pub environment: Environment,
    pub backend_base_url: String,
    pub callback_scheme: String,
    pub has_manual_url: bool,
}

/// Core configuration for the Scout client.
#[derive(Clone)]
pub struct ScoutConfig {
    pub environment: Environment,

    /// Base URL without trailing slash.
    pub backend_base_url: String,

    /// True when `backend_base_url` came from a manual override.
    pub manual_backend_url: bool,

    /// Custom URI scheme the backend redirects to after sign-in.
    pub callback_scheme: String,

    pub request_timeout: Duration,

    /// Upper bound on a whole browser sign-in.
    pub auth_timeout: Duration,

    /// Secure-store key the credential lives under.
    pub credential_key: String,

    /// Credential written when the backend reports `status=success` without a token.
    pub session_placeholder: String,

    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Secure credential storage (required)
    pub secure_store: Arc<dyn SecureStore>,

    pub web_auth_session: Option<Arc<dyn WebAuthSession>>,

    pub ui_dispatcher: Option<Arc<dyn UiDispatcher>>,
}

impl std::fmt::Debug for ScoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutConfig")
            .field("environment", &self.environment)
            .field("backend_base_url", &self.backend_base_url)
            .field("manual_backend_url", &self.manual_backend_url)
            .field("callback_scheme", &self.callback_scheme)
            .field("request_timeout", &self.request_timeout)
            .field("auth_timeout", &self.auth_timeout)
            .field("credential_key", &self.credential_key)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("secure_store", &"SecureStore { ... }")
            .field(
                "web_auth_session",
                &self
                    .web_auth_session
                    .as_ref()
                    .map(|_| "WebAuthSession { ... }"),
            )
            .field(
                "ui_dispatcher",
                &self.ui_dispatcher.as_ref().map(|_| "UiDispatcher { ... }"),
            )
            .finish()
    }
}

impl ScoutConfig {
    pub fn builder() -> ScoutConfigBuilder {
        ScoutConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Backend URL parses and uses http or https
    /// - Callback scheme is a valid URI scheme
    /// - Timeouts are non-zero
    /// - Credential key and session placeholder are non-empty
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.backend_base_url).map_err(|e| {
            Error::Config(format!(
                "Backend URL '{}' is not a valid URL ({}). \
                 Set it with .backend_url() or {}.",
                self.backend_base_url, e, BACKEND_URL_ENV
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if !is_valid_scheme(&self.callback_scheme) {
            return Err(Error::Config(format!(
                "Callback scheme '{}' is invalid. It must start with a letter and \
                 contain only letters, digits, '+', '-' or '.'",
                self.callback_scheme
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.auth_timeout.is_zero() {
            return Err(Error::Config(
                "Auth timeout must be greater than 0".to_string(),
            ));
        }

        if self.credential_key.trim().is_empty() {
            return Err(Error::Config("Credential key cannot be empty".to_string()));
        }

        if self.session_placeholder.is_empty() {
            return Err(Error::Config(
                "Session placeholder cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute URL for a backend path such as `/process-file`.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.backend_base_url, path)
    }

    pub fn auth_url(&self) -> String {
        self.endpoint("/auth/google")
    }

    pub fn health_url(&self) -> String {
        self.endpoint("/health")
    }

    pub fn config_url(&self) -> String {
        self.endpoint("/config")
    }

    pub fn info(&self) -> ConfigInfo {
        ConfigInfo {
            environment: self.environment,
            backend_base_url: self.backend_base_url.clone(),
            callback_scheme: self.callback_scheme.clone(),
            has_manual_url: self.manual_backend_url,
        }
    }
}

/// Joins a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(not(feature = "desktop-shims"))]
fn secure_store_missing_error() -> Error {
    Error::capability_missing(
        "SecureStore",
        "SecureStore implementation is required for credential persistence. \
         Desktop: enable the 'desktop-shims' feature to use the default KeyringSecureStore. \
         Mobile: inject platform-native secure storage (Keychain/Keystore).",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

/// Builder for [`ScoutConfig`].
#[derive(Default)]
pub struct ScoutConfigBuilder {
    environment: Option<Environment>,
    backend_url: Option<String>,
    callback_scheme: Option<String>,
    request_timeout: Option<Duration>,
    auth_timeout: Option<Duration>,
    credential_key: Option<String>,
    session_placeholder: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    web_auth_session: Option<Arc<dyn WebAuthSession>>,
    ui_dispatcher: Option<Arc<dyn UiDispatcher>>,
}

impl ScoutConfigBuilder {
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Manual backend override. Blank values are ignored.
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.trim().is_empty() {
            self.backend_url = Some(url.trim().to_string());
        }
        self
    }

    /// Applies `SCOUT_BACKEND_URL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    pub fn with_env_overrides_from<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(BACKEND_URL_ENV) {
            Some(url) => self.backend_url(url),
            None => self,
        }
    }

    pub fn callback_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.callback_scheme = Some(scheme.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = Some(timeout);
        self
    }

    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    pub fn session_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.session_placeholder = Some(placeholder.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn web_auth_session(mut self, session: Arc<dyn WebAuthSession>) -> Self {
        self.web_auth_session = Some(session);
        self
    }

    pub fn ui_dispatcher(mut self, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        self.ui_dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<ScoutConfig> {
        let environment = self.environment.unwrap_or_default();

        let manual_backend_url = self.backend_url.is_some();
        let backend_base_url = self
            .backend_url
            .unwrap_or_else(|| environment.default_backend_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let config = ScoutConfig {
            environment,
            backend_base_url,
            manual_backend_url,
            callback_scheme: self
                .callback_scheme
                .unwrap_or_else(|| DEFAULT_CALLBACK_SCHEME.to_string()),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            auth_timeout: self.auth_timeout.unwrap_or(DEFAULT_AUTH_TIMEOUT),
            credential_key: self
                .credential_key
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_KEY.to_string()),
            session_placeholder: self
                .session_placeholder
                .unwrap_or_else(|| DEFAULT_SESSION_PLACEHOLDER.to_string()),
            http_client: self.http_client,
            secure_store,
            web_auth_session: self.web_auth_session,
            ui_dispatcher: self.ui_dispatcher,
        };

        config.validate()?;

        Ok(config)
    }
}
