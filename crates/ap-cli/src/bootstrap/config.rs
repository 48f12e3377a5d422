//! # Configuration loader
//!
//! [`load_config`] is pure data loading: whatever the file says ends up in
//! the [`AppConfig`] DTO. [`resolve_config`] is the one place where empty
//! values are replaced by defaults and environment overrides are applied.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ap_core::config::AppConfig;
use tracing::debug;

use super::paths::AppPaths;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_AUTHORITY_URL: &str = "https://edith.moodi.org";
pub const DEFAULT_REGISTRATION_URL: &str = "https://moodi.org/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 800;
pub const DEFAULT_CANONICAL_WIDTH: u32 = 1080;
pub const DEFAULT_RESOURCE_TIMEOUT_MS: u64 = 5_000;

pub const ENV_API_BASE_URL: &str = "ACCESSPASS_API_BASE_URL";
pub const ENV_AUTHORITY_URL: &str = "ACCESSPASS_AUTHORITY_URL";

/// Load configuration from a TOML file.
///
/// **No validation is performed.** Missing sections map to empty values.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::from_toml(&read_toml(config_path)?)
}

fn read_toml(config_path: &Path) -> anyhow::Result<toml::Value> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content).context("Failed to parse config as TOML")
}

/// Load a file and turn pass auto-generation on unless the file sets it.
fn load_with_switches(config_path: &Path) -> anyhow::Result<AppConfig> {
    let toml_value = read_toml(config_path)?;
    let mut config = AppConfig::from_toml(&toml_value)?;
    let auto_generate_set = toml_value
        .get("pass")
        .and_then(|pass| pass.get("auto_generate"))
        .is_some();
    if !auto_generate_set {
        config.auto_generate_pass = true;
    }
    Ok(config)
}

/// Build the effective configuration.
///
/// An explicit `--config` path must exist. The default path is optional: a
/// missing file means "all defaults".
pub fn resolve_config(
    explicit: Option<PathBuf>,
    paths: &AppPaths,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => load_with_switches(&path)?,
        None if paths.config_path.exists() => load_with_switches(&paths.config_path)?,
        None => {
            debug!(path = %paths.config_path.display(), "No config file, using defaults");
            let mut config = AppConfig::empty();
            config.auto_generate_pass = true;
            config
        }
    };

    apply_defaults(&mut config, paths);
    apply_env_overrides(&mut config, env);
    Ok(config)
}

pub fn apply_defaults(config: &mut AppConfig, paths: &AppPaths) {
    fill(&mut config.api_base_url, DEFAULT_API_BASE_URL);
    fill(&mut config.authority_base_url, DEFAULT_AUTHORITY_URL);
    fill(&mut config.registration_url, DEFAULT_REGISTRATION_URL);

    if config.http_timeout_secs == 0 {
        config.http_timeout_secs = DEFAULT_HTTP_TIMEOUT_SECS;
    }
    if config.max_photo_bytes == 0 {
        config.max_photo_bytes = DEFAULT_MAX_PHOTO_BYTES;
    }
    if config.settle_delay_ms == 0 {
        config.settle_delay_ms = DEFAULT_SETTLE_DELAY_MS;
    }
    if config.canonical_width == 0 {
        config.canonical_width = DEFAULT_CANONICAL_WIDTH;
    }
    if config.resource_timeout_ms == 0 {
        config.resource_timeout_ms = DEFAULT_RESOURCE_TIMEOUT_MS;
    }
    if config.session_path.as_os_str().is_empty() {
        config.session_path = paths.session_path.clone();
    }
}

pub fn apply_env_overrides(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    let non_blank = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_blank(ENV_API_BASE_URL) {
        config.api_base_url = url;
    }
    if let Some(url) = non_blank(ENV_AUTHORITY_URL) {
        config.authority_base_url = url;
    }
}

fn fill(value: &mut String, default: &str) {
    if value.trim().is_empty() {
        *value = default.to_string();
    }
}
