use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use ap_core::ports::SessionStorePort;
use ap_core::SessionCredential;

/// The file holds a bearer token; only the owner may read it.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove file failed: {}", path.display())),
    }
}

/// Session credential persisted as a single JSON document.
///
/// Writes go to a sibling temp file and are renamed over the target, so the
/// file always holds one complete credential.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create session dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    async fn atomic_write(&self, content: &str) -> Result<()> {
        self.ensure_parent_dir().await?;

        let tmp_path = self.path.with_extension("json.tmp");
        remove_if_exists(&tmp_path).await?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);

        let mut file = options
            .open(&tmp_path)
            .await
            .with_context(|| format!("create temp session failed: {}", tmp_path.display()))?;
        file.write_all(content.as_bytes())
            .await
            .with_context(|| format!("write temp session failed: {}", tmp_path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("sync temp session failed: {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await.with_context(|| {
            format!(
                "rename temp session to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

#[async_trait]
impl SessionStorePort for FileSessionStore {
    /// Missing file means no session. A file that does not parse is treated
    /// the same way; the session manager clears it on init.
    async fn load(&self) -> Result<Option<SessionCredential>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read session failed: {}", self.path.display()))
            }
        };

        match serde_json::from_str::<SessionCredential>(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Session file is corrupt, ignoring");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, credential: &SessionCredential) -> Result<()> {
        let content =
            serde_json::to_string_pretty(credential).context("serialize session failed")?;
        self.atomic_write(&content).await
    }

    async fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path).await
    }
}
