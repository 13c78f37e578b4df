//! # Host Bridge Traits
//!
//! Capability traits the host application implements so the Scout core can
//! reach the network, the credential vault, the system browser and the UI
//! thread without knowing which platform it runs on.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP requests
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Keystore/Secret Service)
//!
//! ### Platform Integration
//! - [`WebAuthSession`](web_auth::WebAuthSession) - Interactive browser session ending in a custom-scheme redirect
//! - [`UiDispatcher`](dispatch::UiDispatcher) - Hands closures to the UI-affinity execution context
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = config.http_client.clone().ok_or_else(|| Error::CapabilityMissing {
//!     capability: "HttpClient".to_string(),
//!     message: "No HTTP client implementation provided. \
//!              Desktop: enable the `desktop-shims` feature. \
//!              Mobile: inject a platform-native adapter."
//!         .to_string(),
//! })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it, report user dismissal as
//! `BridgeError::Cancelled` and an unpresentable surface as
//! `BridgeError::NotAvailable`.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across tasks.

pub mod dispatch;
pub mod error;
pub mod http;
pub mod logging;
pub mod storage;
pub mod web_auth;

pub use error::BridgeError;

// Re-export commonly used types
pub use dispatch::{InlineDispatcher, UiDispatcher, UiTask};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::SecureStore;
pub use web_auth::WebAuthSession;
