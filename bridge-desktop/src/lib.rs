//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate
//! - `WebAuthSession` using the system browser plus a [`CallbackRouter`]
//! - `UiDispatcher` using a channel drained by the UI event loop
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelUiDispatcher, ReqwestHttpClient, SystemBrowserAuthSession};
//!
//! let http_client = ReqwestHttpClient::new();
//! let browser = SystemBrowserAuthSession::new();
//! let router = browser.router(); // hand to the OS URL-scheme handler
//! let (dispatcher, mut ui_queue) = ChannelUiDispatcher::new();
//! ```

mod dispatch;
mod http;
mod web_auth;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use dispatch::{ChannelUiDispatcher, UiTaskQueue};
pub use http::ReqwestHttpClient;
pub use web_auth::{BrowserLauncher, CallbackRouter, SystemBrowserAuthSession};

#[cfg(feature = "secure-store")]
pub use secure_store::{KeyringSecureStore, DEFAULT_SERVICE_NAME};
