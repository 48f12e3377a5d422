use super::CommandError;
use crate::bootstrap::wiring::Portal;

pub async fn run(portal: &Portal) -> Result<(), CommandError> {
    portal
        .sign_out()
        .execute()
        .await
        .map_err(|err| CommandError::failed(format!("Could not sign out: {err:#}"), true))?;
    println!("Signed out.");
    Ok(())
}
