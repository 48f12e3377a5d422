use async_trait::async_trait;
use thiserror::Error;

use crate::identity::IdentityAssertion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityProviderError {
    #[error("sign-in was cancelled")]
    Cancelled,

    #[error("identity provider failed: {0}")]
    Failed(String),
}

/// Federated identity provider (interactive sign-in).
#[async_trait]
pub trait IdentityProviderPort: Send + Sync {
    async fn sign_in(&self) -> Result<IdentityAssertion, IdentityProviderError>;
}
