//! One-time-code challenge.
//!
//! Pure bookkeeping for the email path: the bot-verification token, the
//! client-side resend countdown and the email a code was last sent to. Time is
//! passed in as epoch milliseconds so the rules stay deterministic.

use thiserror::Error;

use super::SecretToken;

/// Client-side resend countdown, independent of server state.
pub const RESEND_COOLDOWN_SECS: u64 = 60;

/// Local validation failures of the OTP path. None of them reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("please enter your email")]
    MissingEmail,

    #[error("please complete the CAPTCHA")]
    MissingCaptcha,

    #[error("resend available in {remaining_secs} seconds")]
    CooldownActive { remaining_secs: u64 },

    #[error("please enter the OTP")]
    MissingCode,

    #[error("no OTP has been requested yet")]
    NotRequested,
}

/// Everything needed for one `send-otp` call.
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub email: String,
    pub captcha_token: SecretToken,
}

#[derive(Debug, Clone)]
pub struct OtpChallenge {
    cooldown_secs: u64,
    captcha_token: Option<SecretToken>,
    sent_to: Option<String>,
    last_sent_at_ms: Option<i64>,
}

impl Default for OtpChallenge {
    fn default() -> Self {
        Self::new(RESEND_COOLDOWN_SECS)
    }
}

impl OtpChallenge {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown_secs,
            captcha_token: None,
            sent_to: None,
            last_sent_at_ms: None,
        }
    }

    /// Store a freshly solved bot-verification token.
    pub fn solve_captcha(&mut self, token: SecretToken) {
        self.captcha_token = if token.is_empty() { None } else { Some(token) };
    }

    /// The bot-verification token expired; it must be solved again.
    pub fn expire_captcha(&mut self) {
        self.captcha_token = None;
    }

    pub fn has_captcha(&self) -> bool {
        self.captcha_token.is_some()
    }

    /// Email the last code was sent to.
    pub fn sent_to(&self) -> Option<&str> {
        self.sent_to.as_deref()
    }

    /// Whole seconds left before another send is allowed, rounded up.
    pub fn resend_remaining_secs(&self, now_ms: i64) -> u64 {
        let Some(sent_at) = self.last_sent_at_ms else {
            return 0;
        };
        let window_ms = (self.cooldown_secs as i64).saturating_mul(1000);
        let remaining_ms = sent_at.saturating_add(window_ms).saturating_sub(now_ms);
        if remaining_ms <= 0 {
            0
        } else {
            ((remaining_ms + 999) / 1000) as u64
        }
    }

    /// Check every local precondition of a send and hand out a ticket.
    ///
    /// Does not mutate the challenge; call [`OtpChallenge::record_sent`] once the
    /// authority accepted the request.
    pub fn prepare_send(&self, email: &str, now_ms: i64) -> Result<SendTicket, OtpError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(OtpError::MissingEmail);
        }

        let remaining_secs = self.resend_remaining_secs(now_ms);
        if remaining_secs > 0 {
            return Err(OtpError::CooldownActive { remaining_secs });
        }

        let captcha_token = self
            .captcha_token
            .clone()
            .ok_or(OtpError::MissingCaptcha)?;

        Ok(SendTicket {
            email: email.to_string(),
            captcha_token,
        })
    }

    /// The authority accepted a send: start the countdown and consume the captcha.
    pub fn record_sent(&mut self, email: &str, now_ms: i64) {
        self.sent_to = Some(email.trim().to_string());
        self.last_sent_at_ms = Some(now_ms);
        self.captcha_token = None;
    }

    /// Validate a code typed by the user against the pending challenge.
    ///
    /// Returns the email the code belongs to and the trimmed code.
    pub fn prepare_verify(&self, code: &str) -> Result<(String, SecretToken), OtpError> {
        let email = self.sent_to.clone().ok_or(OtpError::NotRequested)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(OtpError::MissingCode);
        }
        Ok((email, SecretToken::new(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn solved() -> OtpChallenge {
        let mut challenge = OtpChallenge::default();
        challenge.solve_captcha(SecretToken::new("captcha"));
        challenge
    }

    #[test]
    fn send_without_captcha_is_rejected_locally() {
        let challenge = OtpChallenge::default();

        let result = challenge.prepare_send("a@b.com", T0);

        assert_eq!(result.unwrap_err(), OtpError::MissingCaptcha);
    }

    #[test]
    fn send_without_email_is_rejected_before_captcha() {
        let challenge = OtpChallenge::default();

        assert_eq!(
            challenge.prepare_send("   ", T0).unwrap_err(),
            OtpError::MissingEmail
        );
    }

    #[test]
    fn record_sent_consumes_captcha_and_starts_countdown() {
        let mut challenge = solved();
        let ticket = challenge.prepare_send(" a@b.com ", T0).unwrap();
        assert_eq!(ticket.email, "a@b.com");

        challenge.record_sent(&ticket.email, T0);

        assert!(!challenge.has_captcha());
        assert_eq!(challenge.sent_to(), Some("a@b.com"));
        assert_eq!(challenge.resend_remaining_secs(T0), 60);
        assert_eq!(challenge.resend_remaining_secs(T0 + 59_001), 1);
        assert_eq!(challenge.resend_remaining_secs(T0 + 60_000), 0);
    }

    #[test]
    fn resend_during_countdown_reports_remaining_seconds() {
        let mut challenge = solved();
        challenge.record_sent("a@b.com", T0);
        challenge.solve_captcha(SecretToken::new("captcha-2"));

        let err = challenge.prepare_send("a@b.com", T0 + 15_000).unwrap_err();

        assert_eq!(err, OtpError::CooldownActive { remaining_secs: 45 });
        assert!(challenge.prepare_send("a@b.com", T0 + 60_000).is_ok());
    }

    #[test]
    fn expired_captcha_must_be_solved_again() {
        let mut challenge = solved();
        challenge.expire_captcha();

        assert_eq!(
            challenge.prepare_send("a@b.com", T0).unwrap_err(),
            OtpError::MissingCaptcha
        );
    }

    #[test]
    fn verify_requires_a_sent_code_and_non_empty_input() {
        let mut challenge = solved();
        assert_eq!(
            challenge.prepare_verify("123456").unwrap_err(),
            OtpError::NotRequested
        );

        challenge.record_sent("a@b.com", T0);
        assert_eq!(challenge.prepare_verify(" ").unwrap_err(), OtpError::MissingCode);

        let (email, code) = challenge.prepare_verify(" 123456 ").unwrap();
        assert_eq!(email, "a@b.com");
        assert_eq!(code.expose(), "123456");
    }
}
