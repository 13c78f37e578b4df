//! Credential Persistence
//!
//! Keeps the single access credential in the host's secure store under one
//! fixed key.
//!
//! `load` never fails: a missing, unreadable or corrupt entry is reported as
//! `None` and logged. Corrupt entries are deleted so the next launch starts
//! clean. `save` and `clear` are the only writers and complete before they
//! return.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{Credential, CredentialStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let store = CredentialStore::new(secure_store, "googleDriveAccessToken");
//!
//! if let Some(credential) = Credential::new("ya29.token") {
//!     store.save(&credential).await?;
//! }
//! assert!(store.load().await.is_some());
//! store.clear().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::Credential;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        Self {
            secure_store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored credential. Absence and storage faults both yield `None`.
    pub async fn load(&self) -> Option<Credential> {
        let bytes = match self.secure_store.get_secret(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %self.key, "No stored credential");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Secure store read failed, treating as signed out");
                return None;
            }
        };

        let credential = String::from_utf8(bytes).ok().and_then(Credential::new);
        if credential.is_none() {
            warn!(key = %self.key, "Stored credential is empty or not UTF-8, deleting it");
            if let Err(e) = self.secure_store.delete_secret(&self.key).await {
                warn!(key = %self.key, error = %e, "Failed to delete corrupt credential");
            }
        }
        credential
    }

    /// Persist `credential`, replacing any previous one.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        self.secure_store
            .set_secret(&self.key, credential.expose().as_bytes())
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to store credential");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(key = %self.key, "Credential stored");
        Ok(())
    }

    /// Remove the credential. Clearing an empty store succeeds.
    pub async fn clear(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to clear credential");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        debug!(key = %self.key, "Credential cleared");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.key)
            .finish()
    }
}
