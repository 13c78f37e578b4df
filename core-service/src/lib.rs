//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, secure
//! storage, browser sign-in, UI dispatch) into the Scout core and exposes
//! the small surface the presentation layer uses:
//!
//! - sign in, sign out, observe the authentication state
//! - submit a file for processing and receive one completion
//!
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) and call [`bootstrap_desktop`]. Mobile hosts inject
//! their own bridges through [`ScoutConfig::builder`].

pub mod error;
pub mod service;

pub use error::{CoreError, Result};
pub use service::{AuthStateObserver, Completion, ScoutService, Subscription};

pub use core_auth::{AuthFlowState, AuthState};
pub use core_runtime::config::{ConfigInfo, Environment, ScoutConfig, ScoutConfigBuilder};
pub use core_runtime::events::{AuthEvent, CoreEvent, EventStream, ProcessingEvent};
pub use provider_orchestrator::{
    FileReference, FolderReference, MoveOutcome, OrchestrationResult, ServiceMessage,
};

#[cfg(feature = "desktop-shims")]
pub use desktop::{bootstrap_desktop, DesktopHandles};

#[cfg(feature = "desktop-shims")]
mod desktop {
    use std::sync::Arc;

    use bridge_desktop::{
        CallbackRouter, ChannelUiDispatcher, ReqwestHttpClient, SystemBrowserAuthSession,
        UiTaskQueue,
    };
    use core_runtime::config::ScoutConfigBuilder;

    use crate::error::{CoreError, Result};
    use crate::service::ScoutService;

    /// Everything a desktop host needs after bootstrap.
    ///
    /// Route incoming `<scheme>://` URLs to `callback_router.deliver` and drain
    /// `ui_queue` on the UI thread.
    pub struct DesktopHandles {
        pub service: ScoutService,
        pub callback_router: CallbackRouter,
        pub ui_queue: UiTaskQueue,
    }

    /// Build a service backed by the desktop bridges.
    ///
    /// Bridges already set on `builder` are kept; missing ones get the
    /// desktop implementation. Call from inside a tokio runtime.
    ///
    /// ```no_run
    /// # async fn example() -> core_service::Result<()> {
    /// use core_service::{bootstrap_desktop, ScoutConfig};
    ///
    /// let handles = bootstrap_desktop(ScoutConfig::builder().with_env_overrides())?;
    /// handles.service.restore_session().await;
    /// tokio::spawn(handles.ui_queue.run());
    /// # Ok(())
    /// # }
    /// ```
    pub fn bootstrap_desktop(builder: ScoutConfigBuilder) -> Result<DesktopHandles> {
        let mut config = builder.build()?;

        if config.http_client.is_none() {
            let client = ReqwestHttpClient::try_with_timeout(config.request_timeout)
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
            config.http_client = Some(Arc::new(client));
        }

        let browser = SystemBrowserAuthSession::new();
        let callback_router = browser.router();
        if config.web_auth_session.is_none() {
            config.web_auth_session = Some(Arc::new(browser));
        }

        let (dispatcher, ui_queue) = ChannelUiDispatcher::new();
        if config.ui_dispatcher.is_none() {
            config.ui_dispatcher = Some(Arc::new(dispatcher));
        }

        Ok(DesktopHandles {
            service: ScoutService::new(config)?,
            callback_router,
            ui_queue,
        })
    }
}
