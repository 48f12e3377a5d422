use async_trait::async_trait;

use crate::identity::SecretToken;

use super::ApiError;

/// Result of exchanging a provider proof with the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityVerdict {
    /// Present only when the user is registered for the event.
    pub token: Option<String>,
}

/// Result of checking a one-time code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpVerification {
    pub verified: bool,
    pub token: Option<String>,
    /// Address the authority verified, when it echoes one back.
    pub email: Option<String>,
    pub name: String,
    pub mi_no: String,
    pub college: String,
    pub gender: String,
    pub phone: String,
}

/// External verification authority (registration lookup and OTP delivery).
#[async_trait]
pub trait VerificationAuthorityPort: Send + Sync {
    /// Exchange a federated proof token. A missing token in the verdict means
    /// the email is not registered.
    async fn verify(&self, proof_token: &SecretToken) -> Result<AuthorityVerdict, ApiError>;

    /// Ask the authority to mail a code. Consumes the captcha token.
    async fn send_otp(&self, email: &str, captcha_token: &SecretToken) -> Result<(), ApiError>;

    async fn verify_otp(&self, email: &str, code: &SecretToken)
        -> Result<OtpVerification, ApiError>;

    /// Page shown to users who are not registered.
    fn registration_url(&self) -> &str;
}
