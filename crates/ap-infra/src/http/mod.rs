//! HTTP adapters.

pub mod authority_client;
pub mod backend_client;
mod error;

pub use authority_client::ReqwestVerificationAuthority;
pub use backend_client::ReqwestAccommodationBackend;

use std::time::Duration;

/// Build the shared HTTP client with a per-request timeout.
pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("build HTTP client failed")
}
