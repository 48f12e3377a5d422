//! Camera capture and verification photo submission.

pub mod engine;
pub mod submit;

pub use engine::{CameraArbiter, CaptureEngine, CaptureFailure, CaptureOptions};
pub use submit::{SubmitError, SubmitVerificationPhoto};
