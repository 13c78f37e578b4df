//! `ScoutService`: the surface the presentation layer calls into.

use std::sync::{Arc, Mutex};

use bridge_traits::dispatch::{UiDispatcher, UiTask};
use core_auth::{
    AuthConfig, AuthFlowState, AuthState, AuthenticationFlowController, CredentialStore,
};
use core_runtime::config::{ConfigInfo, ScoutConfig};
use core_runtime::events::{CoreEvent, EventBus, EventStream, ProcessingEvent};
use provider_orchestrator::{OrchestrationClient, OrchestrationResult, ServiceMessage};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};

/// Completion for the callback-style operations. Invoked exactly once, on the
/// UI dispatcher while it accepts tasks; see [`ScoutService`] for the
/// fallback.
pub type Completion<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// Receives every authentication state change on the UI dispatcher.
pub type AuthStateObserver = Arc<dyn Fn(AuthState) + Send + Sync + 'static>;

/// Keeps an [`ScoutService::observe_auth_state`] registration alive. Dropping
/// it stops delivery.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivery now.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share one controller, client and event bus.
///
/// # Completion delivery
///
/// Completions and [`AuthStateObserver`]s run on the host's [`UiDispatcher`].
/// When the dispatcher refuses a completion (typically because the UI loop
/// has already shut down) the completion runs inline on the runtime worker
/// that finished the operation. That thread is not the UI context, so a
/// completion that may outlive the UI loop must not touch UI objects
/// directly. An auth-state observer stops at the first refused dispatch.
#[derive(Clone)]
pub struct ScoutService {
    inner: Arc<Inner>,
}

struct Inner {
    config_info: ConfigInfo,
    auth: AuthenticationFlowController,
    orchestration: OrchestrationClient,
    ui_dispatcher: Arc<dyn UiDispatcher>,
    event_bus: EventBus,
    runtime: Option<Handle>,
}

impl ScoutService {
    /// Wire the configured bridges into a service.
    ///
    /// Captures the current tokio runtime, if any, for the callback-style
    /// operations.
    ///
    /// # Errors
    ///
    /// `CoreError::CapabilityMissing` when the HTTP client, web auth session
    /// or UI dispatcher bridge was not provided.
    pub fn new(config: ScoutConfig) -> Result<Self> {
        Self::with_event_bus(config, EventBus::default())
    }

    pub fn with_event_bus(config: ScoutConfig, event_bus: EventBus) -> Result<Self> {
        let http_client = config.http_client.clone().ok_or_else(|| {
            missing(
                "HttpClient",
                "No HTTP client implementation provided. \
                 Desktop: enable the `desktop-shims` feature or call `bootstrap_desktop`. \
                 Mobile: inject a platform-native adapter.",
            )
        })?;
        let web_auth = config.web_auth_session.clone().ok_or_else(|| {
            missing(
                "WebAuthSession",
                "No browser sign-in session provided. \
                 Desktop: use `SystemBrowserAuthSession`. \
                 Mobile: wrap the platform web authentication session.",
            )
        })?;
        let ui_dispatcher = config.ui_dispatcher.clone().ok_or_else(|| {
            missing(
                "UiDispatcher",
                "No UI dispatcher provided. Results must be delivered on the UI thread; \
                 use `ChannelUiDispatcher` and drain its queue from the UI loop.",
            )
        })?;

        let credential_store =
            CredentialStore::new(config.secure_store.clone(), config.credential_key.clone());
        let auth = AuthenticationFlowController::new(
            AuthConfig::from_config(&config),
            credential_store,
            web_auth,
            event_bus.clone(),
        );
        let orchestration = OrchestrationClient::from_config(&config, http_client);

        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            debug!("No tokio runtime at construction; callback operations will be unavailable");
        }

        info!(
            environment = config.environment.as_str(),
            backend = %config.backend_base_url,
            "Scout service initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config_info: config.info(),
                auth,
                orchestration,
                ui_dispatcher,
                event_bus,
                runtime,
            }),
        })
    }

    /// Load a stored credential. Call once at startup.
    pub async fn restore_session(&self) -> AuthState {
        self.inner.auth.restore_session().await
    }

    /// Run the browser sign-in flow.
    pub async fn authenticate(&self) -> Result<AuthState> {
        Ok(self.inner.auth.authenticate().await?)
    }

    /// Callback form of [`authenticate`](Self::authenticate).
    pub fn authenticate_with_callback<F>(&self, callback: F)
    where
        F: FnOnce(Result<AuthState>) + Send + 'static,
    {
        let service = self.clone();
        self.spawn_with_completion::<AuthState, _>(Box::new(callback), async move {
            service.authenticate().await
        });
    }

    /// Abort a pending sign-in. It completes as cancelled.
    pub async fn cancel_sign_in(&self) -> bool {
        self.inner.auth.cancel_sign_in().await
    }

    /// Forget the credential. Never fails and makes no network request.
    pub async fn sign_out(&self) {
        self.inner.auth.sign_out().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.auth.is_authenticated()
    }

    pub fn auth_state(&self) -> AuthState {
        self.inner.auth.auth_state()
    }

    pub fn auth_flow_state(&self) -> AuthFlowState {
        self.inner.auth.flow_state()
    }

    pub fn subscribe_auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth.subscribe()
    }

    /// Deliver the current state and every later change to `observer` on the
    /// UI dispatcher.
    pub fn observe_auth_state<F>(&self, observer: F) -> Result<Subscription>
    where
        F: Fn(AuthState) + Send + Sync + 'static,
    {
        let runtime = self.runtime()?;
        let observer: AuthStateObserver = Arc::new(observer);
        let mut receiver = self.inner.auth.subscribe();
        let inner = Arc::clone(&self.inner);

        let task = runtime.spawn(async move {
            loop {
                let state = *receiver.borrow_and_update();
                let observer = Arc::clone(&observer);
                if let Err(e) = inner.ui_dispatcher.dispatch(Box::new(move || observer(state))) {
                    warn!(error = %e, "UI dispatcher closed; stopping auth state observer");
                    break;
                }
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription { task })
    }

    /// Submit a file for processing. Single attempt.
    ///
    /// A backend `error_message` does not make this fail; check
    /// [`OrchestrationResult::soft_error`].
    #[instrument(skip(self, instruction), fields(file_id = %file_id))]
    pub async fn process_file(&self, file_id: &str, instruction: &str) -> Result<OrchestrationResult> {
        let _ = self
            .inner
            .event_bus
            .emit(CoreEvent::Processing(ProcessingEvent::Started {
                file_id: file_id.to_string(),
            }));

        match self.inner.orchestration.process_file(file_id, instruction).await {
            Ok(result) => {
                let _ = self
                    .inner
                    .event_bus
                    .emit(CoreEvent::Processing(ProcessingEvent::Completed {
                        file_id: file_id.to_string(),
                        status_update_count: result.status_updates.len(),
                        soft_error: result.soft_error().map(str::to_string),
                    }));
                Ok(result)
            }
            Err(error) => {
                if error.is_authentication_expired() {
                    warn!("Backend session expired; sign-in required");
                }
                let _ = self
                    .inner
                    .event_bus
                    .emit(CoreEvent::Processing(ProcessingEvent::Failed {
                        file_id: file_id.to_string(),
                        message: error.user_message(),
                        status_code: error.status_code(),
                    }));
                Err(error.into())
            }
        }
    }

    /// Callback form of [`process_file`](Self::process_file).
    pub fn process_file_with_callback<F>(
        &self,
        file_id: impl Into<String>,
        instruction: impl Into<String>,
        callback: F,
    ) where
        F: FnOnce(Result<OrchestrationResult>) + Send + 'static,
    {
        let service = self.clone();
        let file_id = file_id.into();
        let instruction = instruction.into();
        self.spawn_with_completion::<OrchestrationResult, _>(Box::new(callback), async move {
            service.process_file(&file_id, &instruction).await
        });
    }

    /// Backend greeting from `GET /`.
    pub async fn ping(&self) -> Result<ServiceMessage> {
        Ok(self.inner.orchestration.ping().await?)
    }

    pub fn config_info(&self) -> ConfigInfo {
        self.inner.config_info.clone()
    }

    pub fn events(&self) -> EventStream {
        self.inner.event_bus.stream()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    fn runtime(&self) -> Result<Handle> {
        self.inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
            .ok_or_else(|| {
                CoreError::RuntimeUnavailable(
                    "create the service inside a tokio runtime to use callback operations"
                        .to_string(),
                )
            })
    }

    fn spawn_with_completion<T, Fut>(&self, completion: Completion<T>, operation: Fut)
    where
        T: Send + 'static,
        Fut: std::future::Future<Output = Result<T>> + Send + 'static,
    {
        match self.runtime() {
            Ok(runtime) => {
                let inner = Arc::clone(&self.inner);
                runtime.spawn(async move {
                    let result = operation.await;
                    deliver(inner.ui_dispatcher.as_ref(), completion, result);
                });
            }
            Err(error) => deliver(self.inner.ui_dispatcher.as_ref(), completion, Err(error)),
        }
    }
}

/// Hand `result` to `completion` on the UI dispatcher. If the dispatcher
/// rejects the task the completion runs inline, so it still runs once.
fn deliver<T: Send + 'static>(
    dispatcher: &dyn UiDispatcher,
    completion: Completion<T>,
    result: Result<T>,
) {
    let slot = Arc::new(Mutex::new(Some((completion, result))));
    let queued = Arc::clone(&slot);
    let task: UiTask = Box::new(move || {
        if let Some((completion, result)) = take(&queued) {
            completion(result);
        }
    });

    if let Err(e) = dispatcher.dispatch(task) {
        warn!(error = %e, "UI dispatcher rejected completion; running it inline");
        if let Some((completion, result)) = take(&slot) {
            completion(result);
        }
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
}

fn missing(capability: &str, message: &str) -> CoreError {
    CoreError::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

impl std::fmt::Debug for ScoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutService")
            .field("config", &self.inner.config_info)
            .field("auth_state", &self.inner.auth.auth_state())
            .finish()
    }
}
