pub mod controller;

pub use controller::{GateController, GateError, GateVerdict};
