//! Email + one-time-code sign-in.
//!
//! Holds the [`OtpChallenge`] between the send and verify steps and enforces
//! the captcha requirement and the resend countdown before any network call.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, info_span, Instrument};

use ap_core::identity::{OtpError, SecretToken};
use ap_core::ports::{ClockPort, VerificationAuthorityPort};
use ap_core::OtpChallenge;

use super::{AcquireError, Acquired, IdentityAcquirer};

pub struct OtpFlow {
    authority: Arc<dyn VerificationAuthorityPort>,
    acquirer: Arc<IdentityAcquirer>,
    clock: Arc<dyn ClockPort>,
    challenge: Mutex<OtpChallenge>,
}

impl OtpFlow {
    pub fn new(
        authority: Arc<dyn VerificationAuthorityPort>,
        acquirer: Arc<IdentityAcquirer>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            authority,
            acquirer,
            clock,
            challenge: Mutex::new(OtpChallenge::default()),
        }
    }

    pub async fn solve_captcha(&self, token: SecretToken) {
        self.challenge.lock().await.solve_captcha(token);
    }

    /// The bot-verification token expired; another must be solved before sending.
    pub async fn expire_captcha(&self) {
        self.challenge.lock().await.expire_captcha();
    }

    pub async fn resend_remaining_secs(&self) -> u64 {
        self.challenge
            .lock()
            .await
            .resend_remaining_secs(self.clock.now_ms())
    }

    /// Ask the authority to mail a code to `email`.
    ///
    /// On success the countdown starts and the captcha token is consumed. On
    /// failure both stay as they were.
    pub async fn send_code(&self, email: &str) -> Result<(), AcquireError> {
        let span = info_span!("usecase.identity.send_otp", email = %email.trim());

        async {
            let ticket = self
                .challenge
                .lock()
                .await
                .prepare_send(email, self.clock.now_ms())?;

            self.authority
                .send_otp(&ticket.email, &ticket.captcha_token)
                .await
                .map_err(|err| match err {
                    ap_core::ports::ApiError::Rejected { message, .. } => {
                        AcquireError::AuthorityRejected { message }
                    }
                    other if other.is_retryable() => AcquireError::Network(other),
                    other => AcquireError::AuthorityRejected {
                        message: other.to_string(),
                    },
                })?;

            self.challenge
                .lock()
                .await
                .record_sent(&ticket.email, self.clock.now_ms());
            info!("One-time code sent");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Submit the code typed by the user and establish the session.
    pub async fn verify_code(&self, code: &str) -> Result<Acquired, AcquireError> {
        let (email, code) = self.challenge.lock().await.prepare_verify(code)?;
        self.acquirer.complete_otp(&email, &code).await
    }

    pub async fn sent_to(&self) -> Option<String> {
        self.challenge.lock().await.sent_to().map(str::to_string)
    }

    /// Validation result of sending right now, without contacting the authority.
    pub async fn can_send(&self, email: &str) -> Result<(), OtpError> {
        self.challenge
            .lock()
            .await
            .prepare_send(email, self.clock.now_ms())
            .map(|_| ())
    }
}
