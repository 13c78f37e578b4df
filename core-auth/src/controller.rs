//! # Authentication Flow Controller
//!
//! Drives one browser sign-in at a time against the backend's hosted
//! authorization page and owns the resulting session state.
//!
//! ## State
//!
//! - [`AuthState`] is the two-valued flag the UI binds to. It is
//!   `Authenticated` exactly when a credential is stored.
//! - [`AuthFlowState`] tracks the current attempt:
//!   `Idle -> AwaitingCallback -> {Authenticated, Failed, Cancelled}`.
//!
//! Both are published through `tokio::sync::watch` channels so observers get
//! the latest value without polling, and every transition is mirrored on the
//! [`EventBus`].
//!
//! ## Usage
//!
//! ```ignore
//! let controller = AuthenticationFlowController::new(
//!     AuthConfig::from_config(&config),
//!     CredentialStore::new(config.secure_store.clone(), &config.credential_key),
//!     web_auth_session,
//!     event_bus.clone(),
//! );
//!
//! controller.restore_session().await;
//! match controller.authenticate().await {
//!     Ok(_) => println!("signed in"),
//!     Err(AuthError::Cancelled) => {} // not an error for the user
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! ```

use crate::callback::{build_authorization_url, parse_callback};
use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::types::{AuthFlowState, AuthState, CallbackOutcome, Credential};
use bridge_traits::{BridgeError, WebAuthSession};
use core_runtime::config::ScoutConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, SignInMethod};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Settings the controller needs from [`ScoutConfig`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub backend_base_url: String,
    pub callback_scheme: String,
    pub auth_timeout: Duration,
    /// Stored when the callback reports `status=success` without a token.
    /// UI state only; never sent to the backend as a bearer credential.
    pub session_placeholder: String,
}

impl AuthConfig {
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self {
            backend_base_url: config.backend_base_url.clone(),
            callback_scheme: config.callback_scheme.clone(),
            auth_timeout: config.auth_timeout,
            session_placeholder: config.session_placeholder.clone(),
        }
    }
}

/// Cancellation signal of the running sign-in, `None` when idle.
///
/// `Notify::notify_one` keeps a permit, so a cancel that arrives before the
/// attempt starts waiting still ends it.
type SignInSlot = Mutex<Option<Arc<Notify>>>;

fn lock_slot(slot: &SignInSlot) -> MutexGuard<'_, Option<Arc<Notify>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the slot even if the sign-in future is dropped.
struct SignInGuard<'a>(&'a SignInSlot);

impl Drop for SignInGuard<'_> {
    fn drop(&mut self) {
        lock_slot(self.0).take();
    }
}

pub struct AuthenticationFlowController {
    config: AuthConfig,
    credential_store: CredentialStore,
    web_auth: Arc<dyn WebAuthSession>,
    event_bus: EventBus,
    credential: RwLock<Option<Credential>>,
    auth_state: watch::Sender<AuthState>,
    flow_state: watch::Sender<AuthFlowState>,
    sign_in: SignInSlot,
}

impl AuthenticationFlowController {
    pub fn new(
        config: AuthConfig,
        credential_store: CredentialStore,
        web_auth: Arc<dyn WebAuthSession>,
        event_bus: EventBus,
    ) -> Self {
        let (auth_state, _) = watch::channel(AuthState::Unauthenticated);
        let (flow_state, _) = watch::channel(AuthFlowState::Idle);

        Self {
            config,
            credential_store,
            web_auth,
            event_bus,
            credential: RwLock::new(None),
            auth_state,
            flow_state,
            sign_in: Mutex::new(None),
        }
    }

    /// Loads a previously stored credential. Call once at startup.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> AuthState {
        match self.credential_store.load().await {
            Some(credential) => {
                *self.credential.write().await = Some(credential);
                self.auth_state.send_replace(AuthState::Authenticated);
                info!("Restored stored session");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Auth(AuthEvent::SessionRestored));
                AuthState::Authenticated
            }
            None => {
                debug!("No stored session to restore");
                self.auth_state.send_replace(AuthState::Unauthenticated);
                AuthState::Unauthenticated
            }
        }
    }

    /// Runs a full browser sign-in.
    ///
    /// # Errors
    ///
    /// - `AuthError::Cancelled` - the user dismissed the browser
    /// - `AuthError::SessionFailedToStart` - the browser could not be shown
    /// - `AuthError::CallbackMalformed` - the redirect had no usable result
    /// - `AuthError::Timeout` - no redirect within `auth_timeout`
    /// - `AuthError::SignInInProgress` - another sign-in is pending
    /// - `AuthError::SecureStorageUnavailable` - the credential could not be saved
    #[instrument(skip(self), fields(callback_scheme = %self.config.callback_scheme))]
    pub async fn authenticate(&self) -> Result<AuthState> {
        let cancel_signal = {
            let mut slot = lock_slot(&self.sign_in);
            if slot.is_some() {
                warn!("Sign-in already in progress");
                return Err(AuthError::SignInInProgress);
            }
            slot.insert(Arc::new(Notify::new())).clone()
        };
        let _guard = SignInGuard(&self.sign_in);

        let auth_url =
            match build_authorization_url(&self.config.backend_base_url, &self.config.callback_scheme)
            {
                Ok(url) => url,
                Err(e) => return Err(self.fail(e)),
            };

        self.flow_state.send_replace(AuthFlowState::AwaitingCallback);
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SigningIn {
            auth_url: auth_url.to_string(),
        }));
        info!("Opening browser sign-in session");

        let session = self
            .web_auth
            .authenticate(auth_url.as_str(), &self.config.callback_scheme);

        let waited = tokio::select! {
            result = timeout(self.config.auth_timeout, session) => Some(result),
            _ = cancel_signal.notified() => None,
        };

        let callback_uri = match waited {
            Some(Ok(Ok(uri))) => uri,
            Some(Ok(Err(BridgeError::Cancelled(_)))) => return Err(self.finish_cancelled()),
            Some(Ok(Err(BridgeError::NotAvailable(reason)))) => {
                return Err(self.fail(AuthError::SessionFailedToStart(reason)))
            }
            Some(Ok(Err(e))) => return Err(self.fail(AuthError::SessionFailed(e.to_string()))),
            Some(Err(_)) => {
                self.dismiss_session().await;
                return Err(self.fail(AuthError::Timeout {
                    seconds: self.config.auth_timeout.as_secs(),
                }));
            }
            None => {
                self.dismiss_session().await;
                return Err(self.finish_cancelled());
            }
        };

        let outcome = match parse_callback(&callback_uri, &self.config.callback_scheme) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        let (credential, method) = match outcome {
            CallbackOutcome::Token(credential) => (credential, SignInMethod::Token),
            CallbackOutcome::SessionEstablished => {
                match Credential::new(self.config.session_placeholder.clone()) {
                    Some(placeholder) => (placeholder, SignInMethod::Session),
                    None => {
                        return Err(self.fail(AuthError::InvalidConfiguration(
                            "session placeholder is empty".to_string(),
                        )))
                    }
                }
            }
        };

        if let Err(e) = self.credential_store.save(&credential).await {
            return Err(self.fail(e));
        }

        *self.credential.write().await = Some(credential);
        self.auth_state.send_replace(AuthState::Authenticated);
        self.flow_state.send_replace(AuthFlowState::Authenticated);
        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::SignedIn { method }));
        info!(method = ?method, "Sign-in completed");

        Ok(AuthState::Authenticated)
    }

    /// Aborts a pending sign-in; it resolves as cancelled. Returns `false` if
    /// nothing was pending.
    ///
    /// Works at any point of the attempt, including before the browser
    /// session has been presented.
    pub async fn cancel_sign_in(&self) -> bool {
        let Some(signal) = lock_slot(&self.sign_in).clone() else {
            return false;
        };
        signal.notify_one();
        self.dismiss_session().await;
        true
    }

    /// Clears the credential and returns to `Unauthenticated`.
    ///
    /// Never fails and never touches the network. A storage failure is
    /// logged; the in-memory session is dropped regardless.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Err(e) = self.credential_store.clear().await {
            warn!(error = %e, "Failed to clear stored credential during sign-out");
        }

        let had_credential = self.credential.write().await.take().is_some();
        let previous = self.auth_state.send_replace(AuthState::Unauthenticated);
        self.flow_state.send_replace(AuthFlowState::Idle);

        if had_credential || previous.is_authenticated() {
            info!("Signed out");
            let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedOut));
        } else {
            debug!("Sign-out while already signed out");
        }
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth_state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state().is_authenticated()
    }

    pub fn flow_state(&self) -> AuthFlowState {
        *self.flow_state.borrow()
    }

    pub fn is_sign_in_pending(&self) -> bool {
        lock_slot(&self.sign_in).is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth_state.subscribe()
    }

    pub fn subscribe_flow(&self) -> watch::Receiver<AuthFlowState> {
        self.flow_state.subscribe()
    }

    /// The stored credential, if signed in.
    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    async fn dismiss_session(&self) {
        if let Err(e) = self.web_auth.cancel().await {
            debug!(error = %e, "Failed to dismiss browser session");
        }
    }

    fn finish_cancelled(&self) -> AuthError {
        info!("Sign-in cancelled by user");
        self.flow_state.send_replace(AuthFlowState::Cancelled);
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::Cancelled));
        AuthError::Cancelled
    }

    // Leaves any previously stored credential untouched.
    fn fail(&self, error: AuthError) -> AuthError {
        warn!(error = %error, "Sign-in failed");
        self.flow_state.send_replace(AuthFlowState::Failed);
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::AuthError {
            message: error.user_message(),
            recoverable: error.is_recoverable(),
        }));
        error
    }
}

impl std::fmt::Debug for AuthenticationFlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationFlowController")
            .field("config", &self.config)
            .field("auth_state", &self.auth_state())
            .field("flow_state", &self.flow_state())
            .finish()
    }
}
