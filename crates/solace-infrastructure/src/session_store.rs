//! Session store over the durable local store.

use async_trait::async_trait;
use solace_core::error::Result;
use solace_core::session::{Session, SessionStore};
use solace_core::storage::{LocalStore, StateKey};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session store that mirrors the session into three durable keys.
///
/// The mirror is non-authoritative: it exists so a restart can restore the
/// session without a fresh login. Restore is fail-closed — any missing key,
/// or any storage error, restores to nothing.
pub struct LocalSessionStore {
    store: Arc<dyn LocalStore>,
    current: RwLock<Option<Session>>,
}

impl LocalSessionStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    async fn read_key(&self, key: &StateKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(target: "session", "failed to read {}: {e}", key.storage_key());
                None
            }
        }
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn restore(&self) -> Option<Session> {
        let user_id = self.read_key(&StateKey::UserId).await?;
        let user_name = self.read_key(&StateKey::UserName).await?;
        let token = self.read_key(&StateKey::Token).await?;

        let session = Session::new(user_id, user_name, token);
        tracing::info!(target: "session", "restored session for {}", session.user_id);
        *self.current.write().await = Some(session.clone());
        Some(session)
    }

    async fn establish(&self, session: &Session) -> Result<()> {
        let writes = [
            (StateKey::UserId, session.user_id.as_str()),
            (StateKey::UserName, session.user_name.as_str()),
            (StateKey::Token, session.token.as_str()),
        ];

        for (key, value) in &writes {
            if let Err(e) = self.store.put(key, value).await {
                // Roll partial writes back so a later restore fails closed
                // instead of resurrecting a half-written session.
                for (written, _) in &writes {
                    if written == key {
                        break;
                    }
                    let _ = self.store.remove(written).await;
                }
                return Err(e);
            }
        }

        *self.current.write().await = Some(session.clone());
        tracing::info!(target: "session", "established session for {}", session.user_id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.store.remove(&StateKey::UserId).await?;
        self.store.remove(&StateKey::UserName).await?;
        self.store.remove(&StateKey::Token).await?;
        *self.current.write().await = None;
        tracing::info!(target: "session", "session cleared");
        Ok(())
    }

    async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }
}
