//! Stage gate.
//!
//! The only place that decides whether the user may stay on the upload or
//! pass stage. Drives [`GateStateMachine`] with the backend's answer and
//! executes the resulting actions.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use ap_core::ports::{AccommodationBackendPort, ApiError};
use ap_core::{
    AccommodationRecord, BearerToken, CheckRequest, GateAction, GateEvent, GateState, GateStateMachine,
    SessionCredential, Stage,
};

use crate::{SessionManager, ViewScope};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The backend could not be reached; the stage is not yet confirmed.
    #[error("status check failed: {0}")]
    Unconfirmed(#[source] ApiError),

    #[error("failed to update session: {0}")]
    Session(#[source] anyhow::Error),
}

impl GateError {
    pub fn is_retryable(&self) -> bool {
        true
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GateError::Unconfirmed(_) => "Could not check your status. Please try again.",
            GateError::Session(_) => "Could not update your session.",
        }
    }
}

/// Result of entering a gated stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    /// Stay on the requested stage.
    Proceed {
        state: GateState,
        record: AccommodationRecord,
    },
    /// Move to another stage.
    Redirect {
        to: Stage,
        state: GateState,
        record: Option<AccommodationRecord>,
    },
    /// The check already ran for this entry or the view was dismissed.
    Ignored,
}

pub struct GateController {
    backend: Arc<dyn AccommodationBackendPort>,
    session: Arc<SessionManager>,
}

impl GateController {
    pub fn new(backend: Arc<dyn AccommodationBackendPort>, session: Arc<SessionManager>) -> Self {
        Self { backend, session }
    }

    /// Validate entry to `stage` for the view identified by `scope`.
    pub async fn enter(&self, stage: Stage, scope: &ViewScope) -> Result<GateVerdict, GateError> {
        let span = info_span!("usecase.gate.enter", stage = stage.as_str());

        async {
            if !scope.claim_gate_check() {
                debug!("Gate check already ran for this view");
                return Ok(GateVerdict::Ignored);
            }

            let assumed = GateState::assumed_for(stage);

            let Some(credential) = self.session.current().await else {
                info!("No usable session, redirecting to identity");
                let (state, actions) = GateStateMachine::transition(assumed, GateEvent::SessionMissing);
                let to = self.apply(&actions).await?;
                return Ok(redirect_or_proceed(stage, state, to, None));
            };

            let result = self.query(stage, &credential).await;

            if !scope.is_live() {
                debug!("View dismissed before status arrived, ignoring result");
                return Ok(GateVerdict::Ignored);
            }

            let record = match result {
                Ok((record, issued_token)) => {
                    if let Some(token) = issued_token {
                        self.session
                            .adopt_backend_token(token)
                            .await
                            .map_err(GateError::Session)?;
                    }
                    record
                }
                Err(err @ ApiError::AuthRejected { .. }) => {
                    warn!(error = %err, "Session rejected by backend");
                    let (state, actions) =
                        GateStateMachine::transition(assumed, GateEvent::AuthRejected);
                    let to = self.apply(&actions).await?;
                    return Ok(redirect_or_proceed(stage, state, to, None));
                }
                Err(err) => {
                    warn!(error = %err, "Status check failed, stage not confirmed");
                    let (_, actions) =
                        GateStateMachine::transition(assumed, GateEvent::TransientFailure);
                    self.apply(&actions).await?;
                    return Err(GateError::Unconfirmed(err));
                }
            };

            let (state, actions) = GateStateMachine::transition(
                assumed,
                GateEvent::StatusConfirmed {
                    image_uploaded: record.image_uploaded,
                },
            );
            let to = self.apply(&actions).await?;
            info!(
                image_uploaded = record.image_uploaded,
                state = ?state,
                "Stage status confirmed"
            );
            Ok(redirect_or_proceed(stage, state, to, Some(record)))
        }
        .instrument(span)
        .await
    }

    /// Upload stage refreshes through `check`, pass stage reads the full
    /// profile. The check may also hand back a fresh backend token.
    async fn query(
        &self,
        stage: Stage,
        credential: &SessionCredential,
    ) -> Result<(AccommodationRecord, Option<BearerToken>), ApiError> {
        match stage {
            Stage::Pass => {
                let record = self
                    .backend
                    .get_profile(&credential.email, &credential.bearer_token)
                    .await?;
                Ok((record, None))
            }
            Stage::Upload | Stage::Identity => {
                let response = self
                    .backend
                    .check(
                        &CheckRequest::for_email(&credential.email),
                        Some(&credential.bearer_token),
                    )
                    .await?;
                Ok((response.to_record(&credential.email), response.backend_token()))
            }
        }
    }

    async fn apply(&self, actions: &[GateAction]) -> Result<Option<Stage>, GateError> {
        let mut redirect = None;
        for action in actions {
            match action {
                GateAction::ClearSession => {
                    self.session.clear().await.map_err(GateError::Session)?;
                }
                GateAction::Redirect(stage) => redirect = Some(*stage),
            }
        }
        Ok(redirect)
    }
}

fn redirect_or_proceed(
    requested: Stage,
    state: GateState,
    redirect: Option<Stage>,
    record: Option<AccommodationRecord>,
) -> GateVerdict {
    match (redirect, record) {
        (Some(to), record) if to != requested => GateVerdict::Redirect { to, state, record },
        (_, Some(record)) => GateVerdict::Proceed { state, record },
        (_, None) => GateVerdict::Redirect {
            to: state.stage(),
            state,
            record: None,
        },
    }
}
