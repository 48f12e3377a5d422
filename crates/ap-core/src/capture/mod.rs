//! Capture domain module.
//!
//! Photo validation rules, hardware failure causes and the capture state machine.

pub mod hardware;
pub mod photo;
pub mod state_machine;

pub use hardware::{CameraFacing, HardwareError};
pub use photo::{
    CapturedPhoto, PhotoFormat, PhotoSource, PhotoValidationError, MAX_PHOTO_BYTES,
};
pub use state_machine::{CaptureAction, CaptureEvent, CaptureState, CaptureStateMachine};
