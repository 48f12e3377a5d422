use ap_app::usecases::GateVerdict;
use ap_app::ViewScope;
use ap_core::{AccommodationRecord, PersistedReference, Stage};

use super::CommandError;
use crate::bootstrap::wiring::Portal;

pub async fn run(portal: &Portal, scope: &ViewScope) -> Result<(), CommandError> {
    let Some(credential) = portal.session().current().await else {
        return Err(CommandError::SignedOut(
            "Not signed in. Run `accesspass login` first.".to_string(),
        ));
    };
    println!("Signed in as {}", credential.email);

    let gate = portal.gate();
    match gate.enter(Stage::Upload, &scope.child()).await? {
        GateVerdict::Proceed { record, .. } => {
            print_record(&record);
            println!("Verification photo: not uploaded");
            Ok(())
        }
        GateVerdict::Redirect { to: Stage::Pass, .. } => {
            match gate.enter(Stage::Pass, &scope.child()).await? {
                GateVerdict::Proceed { record, .. } => {
                    print_record(&record);
                    println!("Verification photo: uploaded");
                    let reference = record.persisted_pass_path().and_then(|path| {
                        PersistedReference::resolve(&portal.config().api_base_url, path)
                    });
                    match reference {
                        Some(reference) => println!("Pass: {reference}"),
                        None => println!("Pass: not yet issued"),
                    }
                    Ok(())
                }
                verdict => unexpected(verdict),
            }
        }
        verdict => unexpected(verdict),
    }
}

fn unexpected(verdict: GateVerdict) -> Result<(), CommandError> {
    match verdict {
        GateVerdict::Redirect {
            to: Stage::Identity,
            ..
        } => Err(CommandError::SignedOut(
            "Your session has expired. Please sign in again.".to_string(),
        )),
        GateVerdict::Ignored => Err(CommandError::Interrupted),
        _ => Err(CommandError::failed(
            "Your accommodation status changed. Please try again.",
            true,
        )),
    }
}

fn print_record(record: &AccommodationRecord) {
    let field = |value: &str| {
        if value.trim().is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    println!("Name:    {}", field(&record.name));
    println!("MI No:   {}", field(&record.mi_no));
    println!("College: {}", field(&record.college));
}
