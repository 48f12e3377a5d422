//! Process-wide session credential holder.
//!
//! Wraps the persistent [`SessionStorePort`] with an in-memory copy. All
//! writes replace the whole credential while holding the write lock, so a
//! reader sees either the previous or the next credential, never a mix.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use ap_core::ports::SessionStorePort;
use ap_core::{BearerToken, SessionCredential};

pub struct SessionManager {
    store: Arc<dyn SessionStorePort>,
    current: RwLock<Option<SessionCredential>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStorePort>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    /// Load the persisted credential. An incomplete credential is discarded
    /// and the store is cleared.
    pub async fn init(&self) -> Result<Option<SessionCredential>> {
        let loaded = self.store.load().await?;
        let mut current = self.current.write().await;

        match loaded {
            Some(credential) if credential.is_complete() => {
                debug!(email = %credential.email, "Session restored");
                *current = Some(credential.clone());
                Ok(Some(credential))
            }
            Some(_) => {
                warn!("Stored session is incomplete, discarding");
                self.store.clear().await?;
                *current = None;
                Ok(None)
            }
            None => {
                *current = None;
                Ok(None)
            }
        }
    }

    /// Current credential, `None` when missing or incomplete.
    pub async fn current(&self) -> Option<SessionCredential> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_complete())
            .cloned()
    }

    pub async fn set(&self, credential: SessionCredential) -> Result<()> {
        let mut current = self.current.write().await;
        self.store.save(&credential).await?;
        info!(email = %credential.email, issuer = ?credential.token_issuer, "Session stored");
        *current = Some(credential);
        Ok(())
    }

    /// Replace the bearer token with one the backend just issued.
    ///
    /// Returns the updated credential, or `None` when there is no session to
    /// update. Writing the same token again is skipped.
    pub async fn adopt_backend_token(&self, token: BearerToken) -> Result<Option<SessionCredential>> {
        let mut current = self.current.write().await;
        let Some(existing) = current.as_ref() else {
            return Ok(None);
        };
        if existing.bearer_token == token {
            return Ok(Some(existing.clone()));
        }

        let updated = existing.with_backend_token(token);
        self.store.save(&updated).await?;
        debug!(email = %updated.email, "Backend token adopted");
        *current = Some(updated.clone());
        Ok(Some(updated))
    }

    /// Remove every persisted field together.
    pub async fn clear(&self) -> Result<()> {
        let mut current = self.current.write().await;
        *current = None;
        self.store.clear().await?;
        info!("Session cleared");
        Ok(())
    }

    /// Drop the in-memory copy without touching the store.
    pub async fn teardown(&self) {
        self.current.write().await.take();
    }
}
