//! Identity domain module.
//!
//! Models the unverified assertion handed out by the identity provider, the
//! verified identity confirmed by the verification authority, and the OTP
//! challenge that gates the email path.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::session::BearerToken;

pub mod otp;

pub use otp::{OtpChallenge, OtpError, SendTicket, RESEND_COOLDOWN_SECS};

/// A short-lived secret (provider proof token, captcha token, one-time code).
///
/// Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// How the user proves who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMethod {
    /// Federated sign-in (popup flow at the identity provider).
    Federated,
    /// Email plus one-time code, gated by a bot-verification token.
    Otp,
}

impl IdentityMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityMethod::Federated => "federated",
            IdentityMethod::Otp => "otp",
        }
    }
}

/// An unverified claim of identity issued by the identity provider.
///
/// Consumed immediately to obtain a session credential; never persisted.
#[derive(Debug, Clone)]
pub struct IdentityAssertion {
    pub email: String,
    pub proof_token: SecretToken,
    pub issued_at: DateTime<Utc>,
}

/// Profile attributes the verification authority may return with a verified
/// identity. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileHints {
    pub name: String,
    pub mi_no: String,
    pub college: String,
    pub gender: String,
    pub phone: String,
}

/// An identity confirmed by the verification authority.
///
/// `provider_token` is only good for bootstrapping the backend session.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub method: IdentityMethod,
    pub email: String,
    pub provider_token: BearerToken,
    pub hints: ProfileHints,
}
