//! Command handlers.
//!
//! Each handler drives the use cases for one subcommand and maps their
//! errors onto [`CommandError`], whose [`exit_code`](CommandError::exit_code)
//! becomes the process status.

mod login;
mod logout;
mod pass;
mod prompt;
mod status;
mod upload;

use ap_app::usecases::{AcquireError, CaptureFailure, GateError, PassError, SubmitError};
use ap_app::ViewScope;
use ap_core::ports::IdentityProviderError;

use crate::bootstrap::wiring::Portal;
use crate::cli::{Command, LoginMethod};

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_NOT_REGISTERED: u8 = 3;
pub const EXIT_SIGNED_OUT: u8 = 4;
pub const EXIT_RETRYABLE: u8 = 5;
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    NotRegistered(String),

    #[error("{0}")]
    SignedOut(String),

    #[error("{message}")]
    Failed { message: String, retryable: bool },

    #[error("{0}")]
    Usage(String),

    #[error("interrupted")]
    Interrupted,
}

impl CommandError {
    pub fn failed(message: impl Into<String>, retryable: bool) -> Self {
        CommandError::Failed {
            message: message.into(),
            retryable,
        }
    }

    fn session_expired() -> Self {
        CommandError::SignedOut("Your session has expired. Please sign in again.".to_string())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::NotRegistered(_) => EXIT_NOT_REGISTERED,
            CommandError::SignedOut(_) => EXIT_SIGNED_OUT,
            CommandError::Failed {
                retryable: true, ..
            } => EXIT_RETRYABLE,
            CommandError::Failed { .. } => EXIT_FAILURE,
            CommandError::Usage(_) => EXIT_USAGE,
            CommandError::Interrupted => EXIT_INTERRUPTED,
        }
    }
}

impl From<AcquireError> for CommandError {
    fn from(err: AcquireError) -> Self {
        match &err {
            AcquireError::NotRegistered { .. } => CommandError::NotRegistered(err.user_message()),
            AcquireError::Provider(IdentityProviderError::Cancelled) => CommandError::Interrupted,
            AcquireError::Validation(_) => CommandError::Usage(err.user_message()),
            _ => CommandError::failed(err.user_message(), err.is_retryable()),
        }
    }
}

impl From<GateError> for CommandError {
    fn from(err: GateError) -> Self {
        CommandError::failed(err.user_message(), err.is_retryable())
    }
}

impl From<CaptureFailure> for CommandError {
    fn from(err: CaptureFailure) -> Self {
        match err {
            CaptureFailure::Dismissed => CommandError::Interrupted,
            err => CommandError::failed(err.user_message(), err.is_retryable()),
        }
    }
}

impl From<SubmitError> for CommandError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Unauthenticated | SubmitError::AuthRejected => {
                CommandError::session_expired()
            }
            SubmitError::NoPhoto | SubmitError::InvalidId(_) => {
                CommandError::Usage(err.user_message())
            }
            err => CommandError::failed(err.user_message(), err.is_retryable()),
        }
    }
}

impl From<PassError> for CommandError {
    fn from(err: PassError) -> Self {
        match err {
            PassError::Unauthenticated | PassError::AuthRejected => CommandError::session_expired(),
            PassError::Dismissed => CommandError::Interrupted,
            err => CommandError::failed(err.user_message(), err.is_retryable()),
        }
    }
}

pub async fn dispatch(
    portal: &Portal,
    command: Command,
    scope: &ViewScope,
) -> Result<(), CommandError> {
    match command {
        Command::Login {
            method: LoginMethod::Google { email, id_token },
        } => login::google(portal, email, id_token).await,
        Command::Login {
            method: LoginMethod::Otp {
                email,
                captcha_token,
            },
        } => login::otp(portal, email, captcha_token, scope).await,
        Command::Status => status::run(portal, scope).await,
        Command::Upload(args) => upload::run(portal, args, scope).await,
        Command::Pass { now } => pass::run(portal, now, scope).await,
        Command::Logout => logout::run(portal).await,
    }
}
