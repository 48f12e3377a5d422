//! Capture state machine.
//!
//! Pure transitions for the camera lifecycle. The engine in `ap-app` executes
//! the returned actions; every path that leaves `Streaming` emits
//! [`CaptureAction::ReleaseStream`].

use super::{CapturedPhoto, HardwareError};

/// Capture flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// No stream, no photo.
    Idle,
    /// Waiting for the user/host to grant the camera.
    RequestingPermission,
    /// Live preview; the hardware stream is held open.
    Streaming,
    /// A validated photo is ready for submission; no stream is held.
    Captured(CapturedPhoto),
    /// Acquisition or streaming failed. Holds no stream and accepts a new start.
    Error(HardwareError),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::RequestingPermission => "requesting_permission",
            CaptureState::Streaming => "streaming",
            CaptureState::Captured(_) => "captured",
            CaptureState::Error(_) => "error",
        }
    }
}

/// Events that drive the capture flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// User asked to start the camera.
    Start,
    /// Host granted the camera and returned a stream.
    PermissionGranted,
    /// Host refused or failed to provide the camera.
    PermissionFailed(HardwareError),
    /// A snapshot failed validation; the stream stays open for another try.
    FrameRejected,
    /// The open stream failed.
    StreamFailed(HardwareError),
    /// A photo from either producer passed validation.
    PhotoAccepted(CapturedPhoto),
    /// User discarded the photo or preview.
    Retake,
    /// The view is going away.
    Teardown,
}

/// Side-effects produced by capture transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    /// Ask the host for the front camera.
    RequestCamera,
    /// Keep the stream the host just returned.
    AdoptStream,
    /// Stop and drop the held stream, if any.
    ReleaseStream,
}

/// Pure capture state machine.
pub struct CaptureStateMachine;

impl CaptureStateMachine {
    pub fn transition(state: CaptureState, event: CaptureEvent) -> (CaptureState, Vec<CaptureAction>) {
        match (state, event) {
            (CaptureState::RequestingPermission, CaptureEvent::Start) => {
                (CaptureState::RequestingPermission, Vec::new())
            }
            (CaptureState::Streaming, CaptureEvent::Start) => (CaptureState::Streaming, Vec::new()),
            (_, CaptureEvent::Start) => (
                CaptureState::RequestingPermission,
                vec![CaptureAction::RequestCamera],
            ),
            (CaptureState::RequestingPermission, CaptureEvent::PermissionGranted) => {
                (CaptureState::Streaming, vec![CaptureAction::AdoptStream])
            }
            (CaptureState::RequestingPermission, CaptureEvent::PermissionFailed(cause)) => {
                (CaptureState::Error(cause), vec![CaptureAction::ReleaseStream])
            }
            (CaptureState::Streaming, CaptureEvent::FrameRejected) => {
                (CaptureState::Streaming, Vec::new())
            }
            (CaptureState::Streaming, CaptureEvent::StreamFailed(cause)) => {
                (CaptureState::Error(cause), vec![CaptureAction::ReleaseStream])
            }
            (_, CaptureEvent::PhotoAccepted(photo)) => (
                CaptureState::Captured(photo),
                vec![CaptureAction::ReleaseStream],
            ),
            (_, CaptureEvent::Retake) | (_, CaptureEvent::Teardown) => {
                (CaptureState::Idle, vec![CaptureAction::ReleaseStream])
            }
            // Late or out-of-order results leave the state alone; a stream that
            // is not adopted gets stopped by the caller.
            (state, _) => (state, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PhotoFormat, PhotoSource, MAX_PHOTO_BYTES};

    fn photo() -> CapturedPhoto {
        CapturedPhoto::accept(
            vec![1; 32],
            Some(PhotoFormat::Jpeg),
            PhotoSource::Camera,
            MAX_PHOTO_BYTES,
        )
        .unwrap()
    }

    #[test]
    fn start_from_idle_requests_camera() {
        let (next, actions) = CaptureStateMachine::transition(CaptureState::Idle, CaptureEvent::Start);

        assert_eq!(next, CaptureState::RequestingPermission);
        assert_eq!(actions, vec![CaptureAction::RequestCamera]);
    }

    #[test]
    fn start_while_streaming_does_not_open_a_second_stream() {
        let (next, actions) =
            CaptureStateMachine::transition(CaptureState::Streaming, CaptureEvent::Start);

        assert_eq!(next, CaptureState::Streaming);
        assert!(actions.is_empty());
    }

    #[test]
    fn start_after_error_retries() {
        let (next, actions) = CaptureStateMachine::transition(
            CaptureState::Error(HardwareError::DeviceBusy),
            CaptureEvent::Start,
        );

        assert_eq!(next, CaptureState::RequestingPermission);
        assert_eq!(actions, vec![CaptureAction::RequestCamera]);
    }

    #[test]
    fn grant_while_requesting_adopts_stream() {
        let (next, actions) = CaptureStateMachine::transition(
            CaptureState::RequestingPermission,
            CaptureEvent::PermissionGranted,
        );

        assert_eq!(next, CaptureState::Streaming);
        assert_eq!(actions, vec![CaptureAction::AdoptStream]);
    }

    #[test]
    fn late_grant_after_teardown_is_not_adopted() {
        let (next, actions) =
            CaptureStateMachine::transition(CaptureState::Idle, CaptureEvent::PermissionGranted);

        assert_eq!(next, CaptureState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn permission_failure_moves_to_error() {
        let (next, actions) = CaptureStateMachine::transition(
            CaptureState::RequestingPermission,
            CaptureEvent::PermissionFailed(HardwareError::PermissionDenied),
        );

        assert_eq!(next, CaptureState::Error(HardwareError::PermissionDenied));
        assert_eq!(actions, vec![CaptureAction::ReleaseStream]);
    }

    #[test]
    fn rejected_frame_keeps_streaming() {
        let (next, actions) =
            CaptureStateMachine::transition(CaptureState::Streaming, CaptureEvent::FrameRejected);

        assert_eq!(next, CaptureState::Streaming);
        assert!(actions.is_empty());
    }

    #[test]
    fn accepted_photo_always_releases_stream() {
        for state in [CaptureState::Streaming, CaptureState::Idle] {
            let (next, actions) =
                CaptureStateMachine::transition(state, CaptureEvent::PhotoAccepted(photo()));

            assert_eq!(next, CaptureState::Captured(photo()));
            assert_eq!(actions, vec![CaptureAction::ReleaseStream]);
        }
    }

    #[test]
    fn retake_and_teardown_return_to_idle_and_release() {
        for event in [CaptureEvent::Retake, CaptureEvent::Teardown] {
            let (next, actions) =
                CaptureStateMachine::transition(CaptureState::Captured(photo()), event);

            assert_eq!(next, CaptureState::Idle);
            assert_eq!(actions, vec![CaptureAction::ReleaseStream]);
        }
    }
}
