//! Where the signed-in session lives between launches.

use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::Session;
use storage::{Storage, DEFAULT_SESSION_SCOPE};
use tokio::sync::RwLock;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn store(&self, session: &Session) -> Result<()>;
    async fn retrieve(&self) -> Result<Option<Session>>;
    /// Returns whether a session was present.
    async fn clear(&self) -> Result<bool>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn store(&self, session: &Session) -> Result<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn retrieve(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn clear(&self) -> Result<bool> {
        Ok(self.session.write().await.take().is_some())
    }
}

#[async_trait]
impl SessionStore for Storage {
    async fn store(&self, session: &Session) -> Result<()> {
        self.store_session(DEFAULT_SESSION_SCOPE, session).await
    }

    async fn retrieve(&self) -> Result<Option<Session>> {
        Ok(self
            .load_session(DEFAULT_SESSION_SCOPE)
            .await?
            .map(|stored| stored.session))
    }

    async fn clear(&self) -> Result<bool> {
        self.clear_session(DEFAULT_SESSION_SCOPE).await
    }
}
