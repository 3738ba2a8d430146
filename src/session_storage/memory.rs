//! In-memory session storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::Session;
use crate::config::ShopDomain;
use crate::session_storage::{SessionStorage, SessionStorageError};

/// Session storage backed by a `HashMap` behind a `tokio` `RwLock`.
///
/// Sessions are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    sessions: RwLock<HashMap<String, Session>>,
}

// Verify MemorySessionStorage is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemorySessionStorage>();
};

impl MemorySessionStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn store_session(&self, session: &Session) -> Result<(), SessionStorageError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load_session(&self, id: &str) -> Result<Option<Session>, SessionStorageError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<(), SessionStorageError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_sessions(&self, ids: &[String]) -> Result<(), SessionStorageError> {
        let mut sessions = self.sessions.write().await;
        for id in ids {
            sessions.remove(id);
        }
        Ok(())
    }

    async fn find_sessions_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<Session>, SessionStorageError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| &session.shop == shop)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScopes;

    fn offline_session(shop: &str) -> Session {
        let shop = ShopDomain::new(shop).unwrap();
        Session::new(
            Session::offline_id(&shop),
            shop,
            "token".to_string(),
            AuthScopes::new(),
            false,
            None,
        )
    }

    #[tokio::test]
    async fn test_store_replaces_session_with_same_id() {
        let storage = MemorySessionStorage::new();
        let mut session = offline_session("test-shop");
        storage.store_session(&session).await.unwrap();

        session.access_token = "rotated".to_string();
        storage.store_session(&session).await.unwrap();

        assert_eq!(storage.len().await, 1);
        let loaded = storage.load_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "rotated");
    }

    #[tokio::test]
    async fn test_load_missing_session_returns_none() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load_session("offline_nope").await.unwrap().is_none());
    }

    #[test]
    fn test_find_sessions_by_shop_only_returns_that_shop() {
        tokio_test::block_on(async {
            let storage = MemorySessionStorage::new();
            let offline = offline_session("shop-a");
            let mut online = offline.clone();
            online.id = Session::online_id(&online.shop, "42");
            online.is_online = true;
            storage.store_session(&offline).await.unwrap();
            storage.store_session(&online).await.unwrap();
            storage
                .store_session(&offline_session("shop-b"))
                .await
                .unwrap();

            let shop = ShopDomain::new("shop-a").unwrap();
            let mut ids: Vec<_> = storage
                .find_sessions_by_shop(&shop)
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect();
            ids.sort();

            assert_eq!(
                ids,
                vec![
                    "offline_shop-a.myshopify.com".to_string(),
                    "shop-a.myshopify.com_42".to_string()
                ]
            );
        });
    }

    #[tokio::test]
    async fn test_delete_sessions_removes_each_id() {
        let storage = MemorySessionStorage::new();
        let a = offline_session("shop-a");
        let b = offline_session("shop-b");
        storage.store_session(&a).await.unwrap();
        storage.store_session(&b).await.unwrap();

        storage
            .delete_sessions(&[a.id.clone(), b.id.clone(), "missing".to_string()])
            .await
            .unwrap();

        assert!(storage.is_empty().await);
    }
}
