//! Interactive Web Authentication
//!
//! Abstracts the platform surface that shows a backend-hosted sign-in page
//! and hands back the custom-scheme redirect it ends on:
//! - **iOS/macOS**: `ASWebAuthenticationSession`
//! - **Android**: Custom Tabs + intent filter
//! - **Desktop**: System browser + registered URL-scheme handler

use async_trait::async_trait;

use crate::error::Result;

/// Browser-based authentication session
///
/// # Contract
///
/// - `authenticate` resolves exactly once per call.
/// - A successful result is the full callback URI, e.g.
///   `scoutapp://auth?token=abc`.
/// - User dismissal resolves to [`BridgeError::Cancelled`](crate::BridgeError::Cancelled).
/// - A session that cannot be presented at all resolves to
///   [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable).
///
/// # Example
///
/// ```ignore
/// let uri = session
///     .authenticate("http://localhost:8000/auth/google?callback_scheme=scoutapp", "scoutapp")
///     .await?;
/// ```
#[async_trait]
pub trait WebAuthSession: Send + Sync {
    /// Present `auth_url` and wait for a redirect to `callback_scheme`.
    async fn authenticate(&self, auth_url: &str, callback_scheme: &str) -> Result<String>;

    /// Abort the pending session, if any. The pending `authenticate` call
    /// resolves as cancelled.
    async fn cancel(&self) -> Result<()> {
        Ok(())
    }
}
