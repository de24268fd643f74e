//! Fakes shared by the unit tests in this crate.

use crate::session_store::SessionStore;
use crate::types::{AuthToken, Role, Session, UserProfile};
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{HttpClient, HttpRequest, HttpResponse, SecureStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

mockall::mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
pub struct InMemorySecureStore {
    storage: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemorySecureStore {
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.storage.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.storage
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.storage.lock().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.storage.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.storage.lock().await.keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.storage.lock().await.clear();
        Ok(())
    }
}

/// A store already holding the session for user 1 with token `token-abc`.
pub async fn signed_in_store() -> Arc<InMemorySecureStore> {
    let secure = Arc::new(InMemorySecureStore::default());
    SessionStore::new(secure.clone())
        .save(&Session {
            token: AuthToken::new("token-abc"),
            user: UserProfile {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: Role::Admin,
            },
        })
        .await
        .expect("in-memory save");
    secure
}
