use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::fs;

use ap_core::ports::BrandAssetPort;

/// Brand mark read from a file on disk.
pub struct FsBrandAssets {
    path: PathBuf,
}

impl FsBrandAssets {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BrandAssetPort for FsBrandAssets {
    async fn brand_mark(&self) -> Result<Vec<u8>> {
        if self.path.as_os_str().is_empty() {
            bail!("no brand mark configured");
        }
        fs::read(&self.path)
            .await
            .with_context(|| format!("read brand mark failed: {}", self.path.display()))
    }
}
