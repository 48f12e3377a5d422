use std::path::PathBuf;

/// Application configuration DTO (pure data, no logic)
///
/// Empty strings and zeros mean "not configured"; they are facts, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Accommodation backend base URL
    pub api_base_url: String,

    /// Verification authority base URL
    pub authority_base_url: String,

    /// External registration page shown to unregistered users
    pub registration_url: String,

    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,

    /// Photo size limit in bytes; can only lower the 1 MiB ceiling
    pub max_photo_bytes: u64,

    /// Require a government ID with the photo submission
    pub require_govt_id: bool,

    /// Generate the pass automatically once on the pass stage
    pub auto_generate_pass: bool,

    /// Delay before the automatic pass generation, in milliseconds
    pub settle_delay_ms: u64,

    /// Canonical pass width in pixels
    pub canonical_width: u32,

    /// Per-resource load timeout for the pass layout, in milliseconds
    pub resource_timeout_ms: u64,

    /// Brand mark image (path info only, no existence check)
    pub brand_mark_path: PathBuf,

    /// Session file (path info only, no existence check)
    pub session_path: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    ///
    /// **Prohibited**: This method must NOT contain any validation or default
    /// value logic. Missing keys map to empty values.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |section: &str, key: &str| -> String {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let int_at = |section: &str, key: &str| -> i64 {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
        };
        let bool_at = |section: &str, key: &str| -> bool {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        };

        Ok(Self {
            api_base_url: str_at("backend", "api_base_url"),
            authority_base_url: str_at("authority", "base_url"),
            registration_url: str_at("authority", "registration_url"),
            http_timeout_secs: int_at("http", "timeout_secs").max(0) as u64,
            max_photo_bytes: int_at("capture", "max_photo_bytes").max(0) as u64,
            require_govt_id: bool_at("capture", "require_govt_id"),
            auto_generate_pass: bool_at("pass", "auto_generate"),
            settle_delay_ms: int_at("pass", "settle_delay_ms").max(0) as u64,
            canonical_width: int_at("pass", "canonical_width").clamp(0, i64::from(u32::MAX)) as u32,
            resource_timeout_ms: int_at("pass", "resource_timeout_ms").max(0) as u64,
            brand_mark_path: PathBuf::from(str_at("pass", "brand_mark_path")),
            session_path: PathBuf::from(str_at("storage", "session_path")),
        })
    }

    /// Create empty AppConfig (all empty/default values)
    pub fn empty() -> Self {
        Self {
            api_base_url: String::new(),
            authority_base_url: String::new(),
            registration_url: String::new(),
            http_timeout_secs: 0,
            max_photo_bytes: 0,
            require_govt_id: false,
            auto_generate_pass: false,
            settle_delay_ms: 0,
            canonical_width: 0,
            resource_timeout_ms: 0,
            brand_mark_path: PathBuf::new(),
            session_path: PathBuf::new(),
        }
    }
}
