use async_trait::async_trait;
use chrono::Utc;

use ap_core::identity::SecretToken;
use ap_core::ports::{IdentityProviderError, IdentityProviderPort};
use ap_core::IdentityAssertion;

/// Identity provider backed by an assertion passed on the command line.
///
/// The interactive provider sign-in happens outside this tool; the resulting
/// email and ID token are handed in with `--email` and `--id-token`.
pub struct SuppliedAssertionProvider {
    supplied: Option<(String, SecretToken)>,
}

impl SuppliedAssertionProvider {
    pub fn new(email: impl Into<String>, id_token: SecretToken) -> Self {
        Self {
            supplied: Some((email.into(), id_token)),
        }
    }

    /// Provider for flows that never sign in through the federated path.
    pub fn none() -> Self {
        Self { supplied: None }
    }
}

#[async_trait]
impl IdentityProviderPort for SuppliedAssertionProvider {
    async fn sign_in(&self) -> Result<IdentityAssertion, IdentityProviderError> {
        let (email, token) = self
            .supplied
            .as_ref()
            .ok_or_else(|| IdentityProviderError::Failed("no identity assertion supplied".into()))?;
        if token.is_empty() {
            return Err(IdentityProviderError::Cancelled);
        }
        Ok(IdentityAssertion {
            email: email.trim().to_string(),
            proof_token: token.clone(),
            issued_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn supplied_assertion_is_returned_trimmed() {
        let provider = SuppliedAssertionProvider::new(" a@b.com ", SecretToken::new("id"));

        let assertion = provider.sign_in().await.unwrap();

        assert_eq!(assertion.email, "a@b.com");
        assert_eq!(assertion.proof_token.expose(), "id");
    }

    #[tokio::test]
    async fn blank_token_counts_as_cancelled() {
        let provider = SuppliedAssertionProvider::new("a@b.com", SecretToken::new(""));

        assert_eq!(
            provider.sign_in().await.unwrap_err(),
            IdentityProviderError::Cancelled
        );
    }

    #[tokio::test]
    async fn missing_assertion_fails() {
        let err = SuppliedAssertionProvider::none().sign_in().await.unwrap_err();

        assert!(matches!(err, IdentityProviderError::Failed(_)));
    }
}
