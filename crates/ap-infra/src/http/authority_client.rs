//! Verification authority over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use ap_core::identity::SecretToken;
use ap_core::ports::{ApiError, AuthorityVerdict, OtpVerification, VerificationAuthorityPort};

use super::error::{error_text, from_reqwest};

const VERIFY_PATH: &str = "/api/miauth/verify";
const SEND_OTP_PATH: &str = "/api/miauth/send-otp";
const VERIFY_OTP_PATH: &str = "/api/miauth/verify-otp";

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerifyBody {
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpRequest<'a> {
    email: &'a str,
    captcha_token: &'a str,
}

#[derive(Serialize)]
struct VerifyOtpRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VerifyOtpBody {
    verified: bool,
    token: Option<String>,
    email: Option<String>,
    name: Option<String>,
    mi_no: Option<String>,
    college: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
}

pub struct ReqwestVerificationAuthority {
    client: reqwest::Client,
    base_url: String,
    registration_url: String,
}

impl ReqwestVerificationAuthority {
    pub fn new(
        base_url: impl Into<String>,
        registration_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            super::build_client(timeout)?,
            base_url,
            registration_url,
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        registration_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registration_url: registration_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode the answer whatever the status.
    ///
    /// A 5xx whose body does not decode is a transport failure; any other
    /// undecodable body reads as an empty answer.
    async fn post_lenient<B, T>(&self, path: &str, body: &B) -> Result<(bool, T), ApiError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de> + Default,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(from_reqwest)?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(parsed) => Ok((status.is_success(), parsed)),
            Err(_) if status.is_server_error() => Err(ApiError::Network(format!(
                "authority unavailable ({status})"
            ))),
            Err(err) => {
                warn!(%status, error = %err, "Authority answer not understood");
                Ok((status.is_success(), T::default()))
            }
        }
    }
}

#[async_trait]
impl VerificationAuthorityPort for ReqwestVerificationAuthority {
    #[instrument(skip_all)]
    async fn verify(&self, proof_token: &SecretToken) -> Result<AuthorityVerdict, ApiError> {
        let request = VerifyRequest {
            token: proof_token.expose(),
        };
        let (_, body): (_, VerifyBody) = self.post_lenient(VERIFY_PATH, &request).await?;
        let token = body.token.filter(|token| !token.trim().is_empty());
        debug!(registered = token.is_some(), "Authority verify answered");
        Ok(AuthorityVerdict { token })
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn send_otp(&self, email: &str, captcha_token: &SecretToken) -> Result<(), ApiError> {
        let request = SendOtpRequest {
            email,
            captcha_token: captcha_token.expose(),
        };
        let response = self
            .client
            .post(self.url(SEND_OTP_PATH))
            .json(&request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(from_reqwest)?;
        // The authority's 401/403 here concern the captcha, not a session.
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: error_text(&body, "Failed to send OTP"),
        })
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn verify_otp(
        &self,
        email: &str,
        code: &SecretToken,
    ) -> Result<OtpVerification, ApiError> {
        let request = VerifyOtpRequest {
            email,
            otp: code.expose(),
        };
        let (success, body): (_, VerifyOtpBody) =
            self.post_lenient(VERIFY_OTP_PATH, &request).await?;

        Ok(OtpVerification {
            verified: success && body.verified,
            token: body.token,
            email: body.email.filter(|email| !email.trim().is_empty()),
            name: body.name.unwrap_or_default(),
            mi_no: body.mi_no.unwrap_or_default(),
            college: body.college.unwrap_or_default(),
            gender: body.gender.unwrap_or_default(),
            phone: body.phone.unwrap_or_default(),
        })
    }

    fn registration_url(&self) -> &str {
        &self.registration_url
    }
}
