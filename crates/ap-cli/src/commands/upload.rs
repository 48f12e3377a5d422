use tracing::warn;

use ap_app::usecases::{CaptureEngine, CaptureFailure, GateVerdict};
use ap_app::ViewScope;
use ap_core::Stage;

use super::CommandError;
use crate::bootstrap::wiring::Portal;
use crate::cli::UploadArgs;

pub async fn run(portal: &Portal, args: UploadArgs, scope: &ViewScope) -> Result<(), CommandError> {
    let view = scope.child();

    match portal.gate().enter(Stage::Upload, &view).await? {
        GateVerdict::Proceed { .. } => {}
        GateVerdict::Redirect { to: Stage::Pass, .. } => {
            println!("Your photo is already on file. Run `accesspass pass` for your entry pass.");
            return Ok(());
        }
        GateVerdict::Redirect { .. } => {
            return Err(CommandError::SignedOut(
                "Your session has expired. Please sign in again.".to_string(),
            ))
        }
        GateVerdict::Ignored => return Err(CommandError::Interrupted),
    }

    let engine = portal.capture_engine();
    let result = submit(portal, &engine, &args, &view).await;
    engine.teardown().await;
    result
}

async fn submit(
    portal: &Portal,
    engine: &CaptureEngine,
    args: &UploadArgs,
    view: &ViewScope,
) -> Result<(), CommandError> {
    let captured = args.camera && from_camera(engine, view, args.photo.is_some()).await?;
    if !captured {
        let Some(path) = &args.photo else {
            return Err(CommandError::Usage(
                "Choose a photo with --photo <FILE>.".to_string(),
            ));
        };
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            CommandError::Usage(format!("Could not read {}: {err}", path.display()))
        })?;
        engine.select_file(bytes).await?;
    }

    let next = portal
        .submit_photo()
        .execute(engine, &args.id_type, &args.id_number)
        .await?;
    println!("Verification photo uploaded.");
    if next == Stage::Pass {
        println!("Run `accesspass pass` for your entry pass.");
    }
    Ok(())
}

/// `Ok(true)` once a frame was captured. Camera failures are reported and
/// become `Ok(false)` when a file is available to fall back to.
async fn from_camera(
    engine: &CaptureEngine,
    view: &ViewScope,
    has_fallback: bool,
) -> Result<bool, CommandError> {
    let attempt = match engine.start(view).await {
        Ok(_) => engine.capture().await.map(|_| ()),
        Err(err) => Err(err),
    };
    match attempt {
        Ok(()) => Ok(true),
        Err(CaptureFailure::Dismissed) => Err(CommandError::Interrupted),
        Err(err) if has_fallback => {
            warn!(error = %err, "Camera capture failed, using the supplied file");
            eprintln!("{}", err.user_message());
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
