//! Pass domain module.
//!
//! A pass artifact becomes authoritative only once the backend has stored it
//! and returned its path. [`PersistedReference`] is the only value a
//! [`ScannableCode`] may carry, and it can only be built from a server path or
//! an `http(s)` URL, never from a local handle.

use std::fmt;

/// Payload shown in the scannable code before a persisted reference exists.
pub const PLACEHOLDER_PAYLOAD: &str = "ACCESS-PASS-PENDING";

/// Static retrieval prefix for persisted artifacts.
pub const PASSES_PREFIX: &str = "passes";

const LOCAL_SCHEMES: [&str; 4] = ["blob:", "data:", "file:", "about:"];

/// Canonical, backend-confirmed URL of an uploaded pass artifact.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PersistedReference(String);

impl PersistedReference {
    /// Build the full URL for a path returned by the backend.
    ///
    /// Relative paths are served from `{api_base_url}/passes/{path}`. Returns
    /// `None` for blank input and for local-only schemes.
    pub fn resolve(api_base_url: &str, stored_path: &str) -> Option<Self> {
        let path = stored_path.trim();
        if path.is_empty() || is_local(path) {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Self::from_absolute(path);
        }

        let relative = path.trim_start_matches('/');
        let relative = relative
            .strip_prefix(PASSES_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(relative);
        if relative.is_empty() {
            return None;
        }

        Some(Self(format!(
            "{}/{}/{}",
            api_base_url.trim_end_matches('/'),
            PASSES_PREFIX,
            relative
        )))
    }

    fn from_absolute(url: &str) -> Option<Self> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        if rest.is_empty() || rest.starts_with('/') {
            return None;
        }
        Some(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PersistedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PersistedReference").field(&self.0).finish()
    }
}

impl fmt::Display for PersistedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_local(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    LOCAL_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme))
}

/// What the activation surface currently encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannableCode {
    /// Inert placeholder; nothing scannable yet.
    Placeholder,
    /// Active code carrying the persisted reference.
    Active(PersistedReference),
}

impl ScannableCode {
    pub fn payload(&self) -> &str {
        match self {
            ScannableCode::Placeholder => PLACEHOLDER_PAYLOAD,
            ScannableCode::Active(reference) => reference.as_str(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ScannableCode::Active(_))
    }
}

/// Encoded pass image (PNG) ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPass {
    pub bytes: Vec<u8>,
}

impl EncodedPass {
    pub const MIME_TYPE: &'static str = "image/png";
    pub const FILE_NAME: &'static str = "pass.png";
}

impl fmt::Debug for EncodedPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPass")
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Image resources referenced by the pass layout. `None` means the resource
/// failed or timed out and is omitted from the render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResources {
    pub photo: Option<Vec<u8>>,
    pub brand_mark: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:5000";

    #[test]
    fn relative_path_is_served_under_passes_prefix() {
        let reference = PersistedReference::resolve(BASE, "x.png").unwrap();

        assert_eq!(reference.as_str(), "http://localhost:5000/passes/x.png");
    }

    #[test]
    fn existing_prefix_and_trailing_slash_are_not_doubled() {
        let reference = PersistedReference::resolve("http://api/", "/passes/x.png").unwrap();

        assert_eq!(reference.as_str(), "http://api/passes/x.png");
    }

    #[test]
    fn absolute_urls_are_kept_verbatim() {
        let reference =
            PersistedReference::resolve(BASE, "https://cdn.example.org/passes/a.png").unwrap();

        assert_eq!(reference.as_str(), "https://cdn.example.org/passes/a.png");
    }

    #[test]
    fn local_handles_never_become_references() {
        for local in [
            "blob:http://localhost/abc",
            "data:image/png;base64,AAAA",
            "file:///tmp/pass.png",
            "",
            "   ",
            "https://",
            "/passes/",
        ] {
            assert!(
                PersistedReference::resolve(BASE, local).is_none(),
                "{local} must not resolve"
            );
        }
    }

    #[test]
    fn placeholder_payload_is_inert() {
        assert_eq!(ScannableCode::Placeholder.payload(), PLACEHOLDER_PAYLOAD);
        assert!(!ScannableCode::Placeholder.is_active());

        let active = ScannableCode::Active(PersistedReference::resolve(BASE, "x.png").unwrap());
        assert_eq!(active.payload(), "http://localhost:5000/passes/x.png");
    }
}
