//! Gate domain module.
//!
//! This module defines the stage-gating state machine types.

pub mod state_machine;

pub use state_machine::{GateAction, GateEvent, GateState, GateStateMachine, Stage};
