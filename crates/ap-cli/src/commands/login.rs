use std::sync::Arc;

use tracing::info;

use ap_app::usecases::{AcquireError, Acquired};
use ap_app::ViewScope;
use ap_core::identity::SecretToken;
use ap_core::Stage;

use super::prompt::Prompt;
use super::CommandError;
use crate::adapters::SuppliedAssertionProvider;
use crate::bootstrap::wiring::Portal;

const RESEND: &str = "resend";

pub async fn google(portal: &Portal, email: String, id_token: String) -> Result<(), CommandError> {
    let provider = Arc::new(SuppliedAssertionProvider::new(email, SecretToken::new(id_token)));
    let acquired = portal.identity_acquirer(provider).acquire_federated().await?;
    report_signed_in(&acquired);
    Ok(())
}

/// Captcha, send, then read codes until one verifies. Typing `resend` asks
/// for a new code once the countdown has run out.
pub async fn otp(
    portal: &Portal,
    email: String,
    captcha_token: Option<String>,
    scope: &ViewScope,
) -> Result<(), CommandError> {
    let flow = portal.otp_flow();
    let mut prompt = Prompt::stdin();

    let captcha = match captcha_token {
        Some(token) => token,
        None => prompt.ask("CAPTCHA token: ", scope).await?,
    };
    flow.solve_captcha(SecretToken::new(captcha)).await;
    flow.send_code(&email).await?;
    println!("A one-time code was sent to {}.", email.trim());

    loop {
        let input = prompt.ask("Code (or 'resend'): ", scope).await?;

        if input.eq_ignore_ascii_case(RESEND) {
            let remaining = flow.resend_remaining_secs().await;
            if remaining > 0 {
                println!("Resend available in {remaining} seconds.");
                continue;
            }
            let captcha = prompt.ask("CAPTCHA token: ", scope).await?;
            flow.solve_captcha(SecretToken::new(captcha)).await;
            match flow.send_code(&email).await {
                Ok(()) => println!("A new code was sent."),
                Err(err @ (AcquireError::Validation(_) | AcquireError::AuthorityRejected { .. })) => {
                    eprintln!("{}", err.user_message());
                }
                Err(err) => return Err(err.into()),
            }
            continue;
        }

        match flow.verify_code(&input).await {
            Ok(acquired) => {
                report_signed_in(&acquired);
                return Ok(());
            }
            Err(AcquireError::Validation(err)) => eprintln!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

fn report_signed_in(acquired: &Acquired) {
    let credential = &acquired.credential;
    info!(email = %credential.email, next = acquired.next_stage.as_str(), "Signed in");

    let name = if credential.display_name.trim().is_empty() {
        credential.email.as_str()
    } else {
        credential.display_name.as_str()
    };
    println!("Signed in as {name}.");
    match acquired.next_stage {
        Stage::Pass => println!("Your photo is on file. Run `accesspass pass` for your entry pass."),
        _ => println!("Next: upload your verification photo with `accesspass upload`."),
    }
}
