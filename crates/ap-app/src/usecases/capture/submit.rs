use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use ap_core::accommodation::{GovtIdError, PhotoSubmission};
use ap_core::ports::{AccommodationBackendPort, ApiError};
use ap_core::{GovtId, Stage};

use super::CaptureEngine;
use crate::SessionManager;

const UPLOAD_FAILED: &str = "Upload failed";

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("no photo captured")]
    NoPhoto,

    #[error(transparent)]
    InvalidId(#[from] GovtIdError),

    #[error("not signed in")]
    Unauthenticated,

    #[error("session rejected by backend")]
    AuthRejected,

    #[error("{message}")]
    Rejected { message: String },

    #[error("network error: {0}")]
    Network(#[source] ApiError),

    #[error("failed to update session: {0}")]
    Session(#[source] anyhow::Error),
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmitError::Network(_) | SubmitError::Rejected { .. } | SubmitError::InvalidId(_)
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            SubmitError::NoPhoto => "Please capture or choose a photo first.".to_string(),
            SubmitError::InvalidId(err) => err.to_string(),
            SubmitError::Unauthenticated | SubmitError::AuthRejected => {
                "Your session has expired. Please sign in again.".to_string()
            }
            SubmitError::Rejected { message } => message.clone(),
            SubmitError::Network(_) => "Upload failed. Check your connection and try again.".to_string(),
            SubmitError::Session(_) => "Could not update your session.".to_string(),
        }
    }
}

/// Hands the captured photo (and government ID when required) to the backend.
pub struct SubmitVerificationPhoto {
    backend: Arc<dyn AccommodationBackendPort>,
    session: Arc<SessionManager>,
    require_govt_id: bool,
}

impl SubmitVerificationPhoto {
    pub fn new(
        backend: Arc<dyn AccommodationBackendPort>,
        session: Arc<SessionManager>,
        require_govt_id: bool,
    ) -> Self {
        Self {
            backend,
            session,
            require_govt_id,
        }
    }

    /// Upload the engine's captured photo.
    ///
    /// Validation runs before any network call. On success the photo is
    /// discarded and the next stage is returned; on failure it is kept for retry.
    pub async fn execute(
        &self,
        engine: &CaptureEngine,
        id_type: &str,
        id_number: &str,
    ) -> Result<Stage, SubmitError> {
        let span = info_span!("usecase.capture.submit");

        async {
            let photo = engine.photo().await.ok_or(SubmitError::NoPhoto)?;

            let wants_id = self.require_govt_id
                || !id_type.trim().is_empty()
                || !id_number.trim().is_empty();
            let govt_id = if wants_id {
                Some(GovtId::parse(id_type, id_number)?)
            } else {
                None
            };

            let credential = self
                .session
                .current()
                .await
                .ok_or(SubmitError::Unauthenticated)?;

            let submission = PhotoSubmission { photo, govt_id };
            let outcome = match self
                .backend
                .upload_image(&submission, &credential.bearer_token)
                .await
            {
                Ok(outcome) => outcome,
                Err(ApiError::AuthRejected { status }) => {
                    warn!(status, "Upload rejected as unauthorized, clearing session");
                    self.session.clear().await.map_err(SubmitError::Session)?;
                    return Err(SubmitError::AuthRejected);
                }
                Err(ApiError::Rejected { message, .. }) if !message.trim().is_empty() => {
                    return Err(SubmitError::Rejected { message });
                }
                Err(err) => return Err(SubmitError::Network(err)),
            };

            if !outcome.ok {
                let message = outcome
                    .error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UPLOAD_FAILED.to_string());
                warn!(%message, "Backend rejected the photo");
                return Err(SubmitError::Rejected { message });
            }

            engine.discard_photo().await;
            info!(bytes = submission.photo.len(), "Verification photo accepted");
            Ok(Stage::Pass)
        }
        .instrument(span)
        .await
    }
}
