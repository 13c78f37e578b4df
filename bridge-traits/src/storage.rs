//! Secure Storage Abstraction
//!
//! Byte-valued secret vault. The client keeps exactly one entry in it, the
//! Drive access credential, but the trait stays key-based so hosts can back
//! it with whatever their platform offers (Keychain, Keystore, Credential
//! Manager, Secret Service).

use async_trait::async_trait;

use crate::error::Result;

/// Platform credential vault.
///
/// Values must never appear in logs. `delete_secret` on a missing key
/// succeeds, so sign-out stays idempotent.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Overwrites any existing value.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Keys this store knows about. Vaults that cannot enumerate may return
    /// a subset.
    async fn list_keys(&self) -> Result<Vec<String>>;

    async fn clear_all(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct VecStore {
        entries: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for VecStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
            self.entries.lock().await.insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> Result<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.entries.lock().await.keys().cloned().collect())
        }

        async fn clear_all(&self) -> Result<()> {
            self.entries.lock().await.clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_behind_trait_object() {
        let store: Box<dyn SecureStore> = Box::new(VecStore::default());
        let key = "googleDriveAccessToken";

        assert_eq!(store.get_secret(key).await.unwrap(), None);
        store.set_secret(key, b"ya29.a").await.unwrap();
        store.set_secret(key, b"ya29.b").await.unwrap();
        assert_eq!(store.get_secret(key).await.unwrap(), Some(b"ya29.b".to_vec()));
        assert_eq!(store.list_keys().await.unwrap(), vec![key.to_string()]);

        store.delete_secret(key).await.unwrap();
        store.delete_secret(key).await.unwrap();
        assert_eq!(store.get_secret(key).await.unwrap(), None);
    }
}
