use async_trait::async_trait;

use crate::session::SessionCredential;

/// Durable storage for the single session credential.
///
/// `save` replaces the whole credential at once; readers never observe a
/// credential assembled from two different writes.
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<SessionCredential>>;
    async fn save(&self, credential: &SessionCredential) -> anyhow::Result<()>;
    /// Remove the stored credential. Clearing an empty store is not an error.
    async fn clear(&self) -> anyhow::Result<()>;
}
