//! `SecureStore` over the OS credential vault via `keyring`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use keyring::Entry;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Service name entries are filed under in the OS vault.
pub const DEFAULT_SERVICE_NAME: &str = "scout-app";

/// Stores each secret as a base64 password under `(service_name, key)`.
///
/// Keychain, Credential Manager and Secret Service offer no enumeration
/// through `keyring`, so `list_keys` and `clear_all` cover only the keys
/// this instance has read or written.
pub struct KeyringSecureStore {
    service_name: String,
    touched: Mutex<BTreeSet<String>>,
}

impl KeyringSecureStore {
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            touched: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(vault_error)
    }

    fn track(&self, key: &str, present: bool) {
        let Ok(mut touched) = self.touched.lock() else {
            return;
        };
        if present {
            touched.insert(key.to_owned());
        } else {
            touched.remove(key);
        }
    }

    fn tracked_keys(&self) -> Vec<String> {
        match self.touched.lock() {
            Ok(touched) => touched.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

fn vault_error(e: keyring::Error) -> BridgeError {
    match e {
        keyring::Error::NoStorageAccess(inner) => {
            BridgeError::NotAvailable(format!("Credential vault locked or missing: {}", inner))
        }
        keyring::Error::PlatformFailure(inner) => {
            BridgeError::NotAvailable(format!("Credential vault failure: {}", inner))
        }
        other => BridgeError::OperationFailed(format!("Credential vault error: {}", other)),
    }
}

fn decode(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| BridgeError::OperationFailed(format!("Stored secret is not base64: {}", e)))
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entry(key)?
            .set_password(&STANDARD.encode(value))
            .map_err(vault_error)?;
        self.track(key, true);
        debug!(key, "Secret written to vault");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let encoded = match self.entry(key)?.get_password() {
            Ok(encoded) => encoded,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(vault_error(e)),
        };

        self.track(key, true);
        decode(&encoded).map(Some).map_err(|e| {
            warn!(key, error = %e, "Vault entry unreadable");
            e
        })
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.track(key, false);
                debug!(key, "Secret removed from vault");
                Ok(())
            }
            Err(e) => Err(vault_error(e)),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.tracked_keys())
    }

    async fn clear_all(&self) -> Result<()> {
        for key in self.tracked_keys() {
            self.delete_secret(&key).await?;
        }
        Ok(())
    }
}
