//! Access Pass application layer
//!
//! Use cases coordinating the session store, the identity paths, the stage
//! gate, camera capture and pass issuance. Infrastructure is reached only
//! through the ports declared in `ap-core`.

pub mod liveness;
pub mod session_manager;
pub mod usecases;

pub use liveness::ViewScope;
pub use session_manager::SessionManager;
