use std::sync::Arc;

use anyhow::Result;
use tracing::{info_span, Instrument};

use crate::SessionManager;

/// Clears every persisted session field.
pub struct SignOut {
    session: Arc<SessionManager>,
}

impl SignOut {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub async fn execute(&self) -> Result<()> {
        self.session
            .clear()
            .instrument(info_span!("usecase.sign_out.execute"))
            .await
    }
}
