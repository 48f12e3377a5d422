//! # ap-core
//!
//! Core domain models and port contracts for the Access Pass portal client.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the session credential, identity and OTP challenge models, the accommodation
//! record, the gate and capture state machines, the persisted pass reference, and
//! the ports implemented by `ap-infra` and the adapter layer.

// Public module exports
pub mod accommodation;
pub mod capture;
pub mod config;
pub mod gate;
pub mod identity;
pub mod pass;
pub mod ports;
pub mod raster;
pub mod session;

// Re-export commonly used types at the crate root
pub use accommodation::{AccommodationRecord, CheckRequest, CheckResponse, GovtId};
pub use capture::{CaptureState, CapturedPhoto, HardwareError, PhotoFormat, PhotoSource};
pub use config::AppConfig;
pub use gate::{GateAction, GateEvent, GateState, GateStateMachine, Stage};
pub use identity::{IdentityAssertion, OtpChallenge, VerifiedIdentity};
pub use pass::{PersistedReference, ScannableCode};
pub use raster::Raster;
pub use session::{BearerToken, SessionCredential};
