//! Gate state machine.
//!
//! Defines a pure state transition function deciding which stage a user may
//! be on. The backend status is the only input that moves a user forward.

use serde::Serialize;

/// A user-facing stage of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Sign-in (federated or OTP).
    Identity,
    /// Verification photo capture and submission.
    Upload,
    /// Entry pass display.
    Pass,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Identity => "identity",
            Stage::Upload => "upload",
            Stage::Pass => "pass",
        }
    }
}

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Unauthenticated,
    AwaitingUpload,
    ReadyForPass,
}

impl GateState {
    /// State assumed when a stage is entered, before the backend confirms it.
    pub fn assumed_for(stage: Stage) -> Self {
        match stage {
            Stage::Identity => GateState::Unauthenticated,
            Stage::Upload => GateState::AwaitingUpload,
            Stage::Pass => GateState::ReadyForPass,
        }
    }

    /// The stage this state allows the user to be on.
    pub fn stage(&self) -> Stage {
        match self {
            GateState::Unauthenticated => Stage::Identity,
            GateState::AwaitingUpload => Stage::Upload,
            GateState::ReadyForPass => Stage::Pass,
        }
    }
}

/// Events that drive the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// Session store lacks an email or bearer token.
    SessionMissing,
    /// Backend answered with the current upload status.
    StatusConfirmed { image_uploaded: bool },
    /// Backend answered 401/403.
    AuthRejected,
    /// Transport failure or any other non-authoritative failure.
    TransientFailure,
}

/// Side-effects produced by gate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Discard every field of the session store.
    ClearSession,
    /// Leave the current stage for another one.
    Redirect(Stage),
}

/// Pure gate state machine.
pub struct GateStateMachine;

impl GateStateMachine {
    pub fn transition(state: GateState, event: GateEvent) -> (GateState, Vec<GateAction>) {
        match (state, event) {
            (_, GateEvent::SessionMissing) | (_, GateEvent::AuthRejected) => {
                let mut actions = vec![GateAction::ClearSession];
                if state != GateState::Unauthenticated {
                    actions.push(GateAction::Redirect(Stage::Identity));
                }
                (GateState::Unauthenticated, actions)
            }
            (state, GateEvent::TransientFailure) => (state, Vec::new()),
            (state, GateEvent::StatusConfirmed { image_uploaded }) => {
                let next = if image_uploaded {
                    GateState::ReadyForPass
                } else {
                    GateState::AwaitingUpload
                };
                if next == state {
                    (next, Vec::new())
                } else {
                    (next, vec![GateAction::Redirect(next.stage())])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_uploaded_on_pass_stage_redirects_to_upload() {
        let (next, actions) = GateStateMachine::transition(
            GateState::ReadyForPass,
            GateEvent::StatusConfirmed {
                image_uploaded: false,
            },
        );

        assert_eq!(next, GateState::AwaitingUpload);
        assert_eq!(actions, vec![GateAction::Redirect(Stage::Upload)]);
    }

    #[test]
    fn uploaded_on_upload_stage_redirects_to_pass() {
        let (next, actions) = GateStateMachine::transition(
            GateState::AwaitingUpload,
            GateEvent::StatusConfirmed {
                image_uploaded: true,
            },
        );

        assert_eq!(next, GateState::ReadyForPass);
        assert_eq!(actions, vec![GateAction::Redirect(Stage::Pass)]);
    }

    #[test]
    fn confirmed_status_matching_the_stage_stays() {
        let (next, actions) = GateStateMachine::transition(
            GateState::ReadyForPass,
            GateEvent::StatusConfirmed {
                image_uploaded: true,
            },
        );

        assert_eq!(next, GateState::ReadyForPass);
        assert!(actions.is_empty());
    }

    #[test]
    fn auth_rejection_clears_session_and_redirects_to_identity() {
        for state in [GateState::AwaitingUpload, GateState::ReadyForPass] {
            let (next, actions) = GateStateMachine::transition(state, GateEvent::AuthRejected);

            assert_eq!(next, GateState::Unauthenticated);
            assert_eq!(
                actions,
                vec![
                    GateAction::ClearSession,
                    GateAction::Redirect(Stage::Identity)
                ]
            );
        }
    }

    #[test]
    fn missing_session_on_identity_stage_only_clears() {
        let (next, actions) =
            GateStateMachine::transition(GateState::Unauthenticated, GateEvent::SessionMissing);

        assert_eq!(next, GateState::Unauthenticated);
        assert_eq!(actions, vec![GateAction::ClearSession]);
    }

    #[test]
    fn transient_failure_keeps_state() {
        for state in [
            GateState::Unauthenticated,
            GateState::AwaitingUpload,
            GateState::ReadyForPass,
        ] {
            let (next, actions) = GateStateMachine::transition(state, GateEvent::TransientFailure);

            assert_eq!(next, state);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn status_after_sign_in_routes_by_upload_flag() {
        let (next, actions) = GateStateMachine::transition(
            GateState::Unauthenticated,
            GateEvent::StatusConfirmed {
                image_uploaded: false,
            },
        );

        assert_eq!(next, GateState::AwaitingUpload);
        assert_eq!(actions, vec![GateAction::Redirect(Stage::Upload)]);
    }
}
