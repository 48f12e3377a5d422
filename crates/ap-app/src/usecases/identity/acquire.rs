use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use ap_core::identity::{IdentityMethod, ProfileHints, SecretToken};
use ap_core::ports::{
    AccommodationBackendPort, ApiError, IdentityProviderError, IdentityProviderPort,
    VerificationAuthorityPort,
};
use ap_core::session::TokenIssuer;
use ap_core::{BearerToken, CheckRequest, CheckResponse, SessionCredential, Stage, VerifiedIdentity};

use crate::SessionManager;

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("this email is not registered for the event")]
    NotRegistered { registration_url: String },

    #[error("network error: {0}")]
    Network(#[source] ApiError),

    #[error("verification authority rejected the request: {message}")]
    AuthorityRejected { message: String },

    #[error("backend rejected the status check: {0}")]
    BackendRejected(#[source] ApiError),

    #[error(transparent)]
    Provider(#[from] IdentityProviderError),

    #[error(transparent)]
    Validation(#[from] ap_core::identity::OtpError),

    #[error("failed to store session: {0}")]
    Storage(#[source] anyhow::Error),
}

impl AcquireError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AcquireError::Network(_) | AcquireError::Validation(_) | AcquireError::Storage(_)
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            AcquireError::NotRegistered { registration_url } => format!(
                "You are not registered for the event. Register at {registration_url}"
            ),
            AcquireError::Network(_) => "Network error. Try again.".to_string(),
            AcquireError::AuthorityRejected { message } => message.clone(),
            AcquireError::BackendRejected(_) => {
                "Could not confirm your accommodation status. Please try again later.".to_string()
            }
            AcquireError::Provider(IdentityProviderError::Cancelled) => {
                "Sign-in was cancelled.".to_string()
            }
            AcquireError::Provider(_) => "Sign-in failed. Please try again.".to_string(),
            AcquireError::Validation(err) => err.to_string(),
            AcquireError::Storage(_) => "Could not save your session.".to_string(),
        }
    }

    fn from_authority(err: ApiError) -> Self {
        match err {
            err if err.is_retryable() => AcquireError::Network(err),
            ApiError::Rejected { message, .. } => AcquireError::AuthorityRejected { message },
            other => AcquireError::AuthorityRejected {
                message: other.to_string(),
            },
        }
    }

    fn from_check(err: ApiError) -> Self {
        if err.is_retryable() {
            AcquireError::Network(err)
        } else {
            AcquireError::BackendRejected(err)
        }
    }
}

/// Session established by a successful identity path.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub credential: SessionCredential,
    pub status: CheckResponse,
    pub next_stage: Stage,
}

/// Exchanges a provisional identity for a backend-confirmed session.
///
/// The session store is written exactly once per attempt, after the backend
/// status check succeeded.
pub struct IdentityAcquirer {
    provider: Arc<dyn IdentityProviderPort>,
    authority: Arc<dyn VerificationAuthorityPort>,
    backend: Arc<dyn AccommodationBackendPort>,
    session: Arc<SessionManager>,
}

impl IdentityAcquirer {
    pub fn new(
        provider: Arc<dyn IdentityProviderPort>,
        authority: Arc<dyn VerificationAuthorityPort>,
        backend: Arc<dyn AccommodationBackendPort>,
        session: Arc<SessionManager>,
    ) -> Self {
        Self {
            provider,
            authority,
            backend,
            session,
        }
    }

    /// Federated path: provider sign-in, authority verify, backend check.
    ///
    /// Any previous session is cleared first.
    pub async fn acquire_federated(&self) -> Result<Acquired, AcquireError> {
        let span = info_span!("usecase.identity.acquire_federated");

        async {
            self.session.clear().await.map_err(AcquireError::Storage)?;

            let assertion = self.provider.sign_in().await?;
            info!(email = %assertion.email, "Identity provider sign-in completed");

            let verdict = self
                .authority
                .verify(&assertion.proof_token)
                .await
                .map_err(AcquireError::from_authority)?;

            let Some(token) = non_empty(verdict.token) else {
                warn!(email = %assertion.email, "Authority returned no token");
                return Err(self.not_registered());
            };

            let identity = VerifiedIdentity {
                method: IdentityMethod::Federated,
                email: assertion.email,
                provider_token: BearerToken::new(token),
                hints: ProfileHints::default(),
            };
            self.bootstrap(identity).await
        }
        .instrument(span)
        .await
    }

    /// OTP path, second half: check the code and bootstrap the session.
    pub async fn complete_otp(
        &self,
        email: &str,
        code: &SecretToken,
    ) -> Result<Acquired, AcquireError> {
        let span = info_span!("usecase.identity.complete_otp", email = %email);

        async {
            let verification = self
                .authority
                .verify_otp(email, code)
                .await
                .map_err(AcquireError::from_authority)?;

            let token = if verification.verified {
                non_empty(verification.token)
            } else {
                None
            };
            let Some(token) = token else {
                warn!("One-time code not verified or no token returned");
                return Err(self.not_registered());
            };

            let identity = VerifiedIdentity {
                method: IdentityMethod::Otp,
                email: verification.email.unwrap_or_else(|| email.to_string()),
                provider_token: BearerToken::new(token),
                hints: ProfileHints {
                    name: verification.name,
                    mi_no: verification.mi_no,
                    college: verification.college,
                    gender: verification.gender,
                    phone: verification.phone,
                },
            };
            self.bootstrap(identity).await
        }
        .instrument(span)
        .await
    }

    async fn bootstrap(&self, identity: VerifiedIdentity) -> Result<Acquired, AcquireError> {
        // Federated check goes out without a token; the OTP path authenticates
        // with the provider token and forwards the profile hints.
        let (request, auth) = match identity.method {
            IdentityMethod::Federated => (CheckRequest::for_email(&identity.email), None),
            IdentityMethod::Otp => (
                CheckRequest::for_email(&identity.email).with_hints(&identity.hints),
                Some(&identity.provider_token),
            ),
        };

        let status = self
            .backend
            .check(&request, auth)
            .await
            .map_err(AcquireError::from_check)?;

        let (token, issuer) = match status.backend_token() {
            Some(token) => (token, TokenIssuer::Backend),
            None => (identity.provider_token.clone(), TokenIssuer::Provider),
        };

        let mut credential = SessionCredential::new(&identity.email, token, issuer);
        credential.display_name = status.name.clone();
        credential.college_id = status.college.clone();
        credential.gender = status.gender.clone();
        credential.phone = status.phone.clone();
        credential.mi_no = status.mi_no.clone();

        self.session
            .set(credential.clone())
            .await
            .map_err(AcquireError::Storage)?;

        let next_stage = if status.image_uploaded {
            Stage::Pass
        } else {
            Stage::Upload
        };
        info!(
            method = identity.method.as_str(),
            issuer = ?credential.token_issuer,
            next_stage = next_stage.as_str(),
            "Session established"
        );

        Ok(Acquired {
            credential,
            status,
            next_stage,
        })
    }

    fn not_registered(&self) -> AcquireError {
        AcquireError::NotRegistered {
            registration_url: self.authority.registration_url().to_string(),
        }
    }
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|token| !token.trim().is_empty())
}
