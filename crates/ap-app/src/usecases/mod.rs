pub mod capture;
pub mod gate;
pub mod identity;
pub mod pass;
pub mod sign_out;

pub use capture::{
    CameraArbiter, CaptureEngine, CaptureFailure, CaptureOptions, SubmitError,
    SubmitVerificationPhoto,
};
pub use gate::{GateController, GateError, GateVerdict};
pub use identity::{AcquireError, Acquired, IdentityAcquirer, OtpFlow};
pub use pass::{PassCompositor, PassError, PassOptions};
pub use sign_out::SignOut;
