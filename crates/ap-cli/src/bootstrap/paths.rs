use std::path::{Path, PathBuf};

use anyhow::Context;

const APP_DIR_NAME: &str = "accesspass";

/// Concrete locations derived from the platform's per-user directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_path: PathBuf,
    pub session_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppPaths {
    pub fn from_roots(config_root: &Path, data_root: &Path) -> Self {
        Self {
            config_path: config_root.join("config.toml"),
            session_path: data_root.join("session.json"),
            logs_dir: data_root.join("logs"),
        }
    }

    /// `dirs::config_dir()` and `dirs::data_local_dir()`, each with the app subdirectory.
    pub fn system() -> anyhow::Result<Self> {
        let config_root = dirs::config_dir()
            .context("no config directory on this platform")?
            .join(APP_DIR_NAME);
        let data_root = dirs::data_local_dir()
            .context("no local data directory on this platform")?
            .join(APP_DIR_NAME);
        Ok(Self::from_roots(&config_root, &data_root))
    }
}
