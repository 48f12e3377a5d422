//! View liveness.
//!
//! A [`ViewScope`] is created when a stage view is entered and dismissed when
//! it goes away. Flows check it after every suspension point and drop late
//! results instead of mutating state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    cancel: CancellationToken,
    gate_checked: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// A fresh entry nested in this one. Dismissing the parent dismisses it;
    /// its gate check is independent.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            gate_checked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn dismiss(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the view is dismissed.
    pub async fn dismissed(&self) {
        self.cancel.cancelled().await;
    }

    /// Returns `true` only for the first caller; the gate check runs once per entry.
    pub fn claim_gate_check(&self) -> bool {
        !self.gate_checked.swap(true, Ordering::SeqCst)
    }
}
