use std::sync::Arc;

use ap_app::usecases::GateVerdict;
use ap_app::ViewScope;
use ap_core::Stage;

use super::CommandError;
use crate::adapters::TerminalActivationSurface;
use crate::bootstrap::wiring::Portal;

pub async fn run(portal: &Portal, now: bool, scope: &ViewScope) -> Result<(), CommandError> {
    let view = scope.child();

    let record = match portal.gate().enter(Stage::Pass, &view).await? {
        GateVerdict::Proceed { record, .. } => record,
        GateVerdict::Redirect {
            to: Stage::Upload, ..
        } => {
            return Err(CommandError::failed(
                "Upload your verification photo first with `accesspass upload`.",
                false,
            ))
        }
        GateVerdict::Redirect { .. } => {
            return Err(CommandError::SignedOut(
                "Your session has expired. Please sign in again.".to_string(),
            ))
        }
        GateVerdict::Ignored => return Err(CommandError::Interrupted),
    };

    let compositor = portal.pass_compositor(Arc::new(TerminalActivationSurface::stdout()));
    if compositor.load(record).await?.is_active() {
        return Ok(());
    }

    let attempt = if now {
        Some(compositor.generate(&view).await)
    } else {
        compositor.auto_generate(&view).await
    };
    match attempt {
        Some(result) => {
            result?;
        }
        None if !view.is_live() => return Err(CommandError::Interrupted),
        None => {
            compositor.generate(&view).await?;
        }
    }
    Ok(())
}
