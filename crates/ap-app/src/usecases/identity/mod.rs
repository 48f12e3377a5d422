//! Identity acquisition: federated and email + one-time-code paths.

pub mod acquire;
pub mod otp_flow;

pub use acquire::{AcquireError, Acquired, IdentityAcquirer};
pub use otp_flow::OtpFlow;
