//! Secure Credential Storage using OS Keychain

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use keyring::Entry;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

const DEFAULT_SERVICE_NAME: &str = "libdash";

/// Keyring-based secure storage implementation
///
/// Uses platform-specific secure storage:
/// - macOS: Keychain
/// - Windows: Credential Manager (DPAPI)
/// - Linux: Secret Service (libsecret)
///
/// Keyring cannot enumerate entries, so the store tracks the keys it knows
/// about: the ones passed to [`with_tracked_keys`](Self::with_tracked_keys)
/// plus every key written through this instance.
#[derive(Clone)]
pub struct KeyringSecureStore {
    service_name: String,
    tracked_keys: Arc<Mutex<BTreeSet<String>>>,
}

impl KeyringSecureStore {
    /// Create a new secure store with default service name
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_SERVICE_NAME)
    }

    /// Create a new secure store with custom service name
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            tracked_keys: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// Register keys that may have been written by an earlier process
    pub fn with_tracked_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        Self {
            service_name: self.service_name,
            tracked_keys: Arc::new(Mutex::new(keys)),
        }
    }

    /// Get a keyring entry for the given key
    fn get_entry(&self, key: &str) -> std::result::Result<Entry, keyring::Error> {
        Entry::new(&self.service_name, key)
    }

    /// Convert keyring error to BridgeError
    fn map_keyring_error(e: keyring::Error) -> BridgeError {
        BridgeError::OperationFailed(format!("Keyring error: {}", e))
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        // Keyring only supports strings, so binary data is base64 encoded
        let encoded = encoding::encode(value);

        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;
        entry
            .set_password(&encoded)
            .map_err(Self::map_keyring_error)?;

        self.tracked_keys.lock().await.insert(key.to_string());
        debug!(key = key, "Stored secret in keyring");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.get_password() {
            Ok(encoded) => {
                let decoded = encoding::decode(&encoded).map_err(|e| {
                    error!(key = key, error = %e, "Failed to decode secret");
                    BridgeError::OperationFailed(format!("Failed to decode secret: {}", e))
                })?;
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(key = key, "Secret not found in keyring");
                Ok(None)
            }
            Err(e) => Err(Self::map_keyring_error(e)),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.delete_credential() {
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!(key = key, "Deleted secret from keyring");
                Ok(())
            }
            Err(e) => Err(Self::map_keyring_error(e)),
        }
    }

    async fn has_secret(&self, key: &str) -> Result<bool> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(Self::map_keyring_error(e)),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let tracked: Vec<String> = self.tracked_keys.lock().await.iter().cloned().collect();
        let mut present = Vec::with_capacity(tracked.len());
        for key in tracked {
            if self.has_secret(&key).await? {
                present.push(key);
            }
        }
        Ok(present)
    }

    async fn clear_all(&self) -> Result<()> {
        let tracked: Vec<String> = self.tracked_keys.lock().await.iter().cloned().collect();
        for key in tracked {
            self.delete_secret(&key).await?;
        }
        Ok(())
    }
}

mod encoding {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(data: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let store = KeyringSecureStore::new();
        assert_eq!(store.service_name, "libdash");
    }

    #[tokio::test]
    async fn test_tracked_keys_are_registered() {
        let store = KeyringSecureStore::with_service_name("libdash-test")
            .with_tracked_keys(["auth_token", "auth_user"]);
        let tracked = store.tracked_keys.lock().await.clone();
        assert!(tracked.contains("auth_token"));
        assert!(tracked.contains("auth_user"));
        assert_eq!(store.service_name, "libdash-test");
    }

    #[test]
    fn test_encoding_roundtrip() {
        let encoded = encoding::encode(b"token-value");
        assert_eq!(encoding::decode(&encoded).unwrap(), b"token-value".to_vec());
    }
}
