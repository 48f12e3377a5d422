//! Session credential domain model.
//!
//! A [`SessionCredential`] is the only state the client keeps across runs. It is
//! always read and written as a whole unit; a credential missing its email or
//! bearer token is treated as no session at all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer token presented on authenticated backend calls.
///
/// `Debug` and `Display` never print the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw token for placing it in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Where the bearer token currently held in a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenIssuer {
    /// Issued by the verification authority; only good for bootstrapping.
    Provider,
    /// Issued by the accommodation backend.
    Backend,
}

/// The persisted session: bearer token plus cached profile attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub bearer_token: BearerToken,
    pub token_issuer: TokenIssuer,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub college_id: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub mi_no: String,
}

impl SessionCredential {
    /// Build a bare credential holding only the email and token.
    pub fn new(email: impl Into<String>, bearer_token: BearerToken, issuer: TokenIssuer) -> Self {
        Self {
            bearer_token,
            token_issuer: issuer,
            email: email.into(),
            display_name: String::new(),
            college_id: String::new(),
            gender: String::new(),
            phone: String::new(),
            mi_no: String::new(),
        }
    }

    /// Both required fields are present.
    ///
    /// Anything else is read as `Unauthenticated`.
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.bearer_token.is_empty()
    }

    /// Return a copy of this credential carrying a backend-issued token.
    ///
    /// The result is meant to be written back as a whole unit.
    pub fn with_backend_token(&self, token: BearerToken) -> Self {
        Self {
            bearer_token: token,
            token_issuer: TokenIssuer::Backend,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(email: &str, token: &str) -> SessionCredential {
        SessionCredential::new(email, BearerToken::new(token), TokenIssuer::Provider)
    }

    #[test]
    fn debug_output_never_contains_token() {
        let credential = credential("a@b.com", "super-secret-token");

        let rendered = format!("{credential:?}");

        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn credential_without_email_or_token_is_incomplete() {
        assert!(credential("a@b.com", "t").is_complete());
        assert!(!credential("", "t").is_complete());
        assert!(!credential("a@b.com", "   ").is_complete());
    }

    #[test]
    fn with_backend_token_keeps_profile_and_marks_issuer() {
        let mut original = credential("a@b.com", "provider");
        original.display_name = "Asha".to_string();

        let updated = original.with_backend_token(BearerToken::new("backend"));

        assert_eq!(updated.bearer_token.expose(), "backend");
        assert_eq!(updated.token_issuer, TokenIssuer::Backend);
        assert_eq!(updated.display_name, "Asha");
        assert_eq!(updated.email, "a@b.com");
    }

    #[test]
    fn serialized_form_keeps_token_value() {
        let json = serde_json::to_string(&credential("a@b.com", "abc")).unwrap();

        assert!(json.contains("\"bearer_token\":\"abc\""));
        let back: SessionCredential = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bearer_token.expose(), "abc");
    }
}
