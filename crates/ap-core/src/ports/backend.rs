use async_trait::async_trait;

use crate::accommodation::{
    AccommodationRecord, CheckRequest, CheckResponse, PhotoSubmission, SavePassOutcome,
    UploadOutcome,
};
use crate::pass::EncodedPass;
use crate::session::BearerToken;

use super::ApiError;

/// Accommodation backend HTTP surface.
#[async_trait]
pub trait AccommodationBackendPort: Send + Sync {
    /// `POST /api/accommodation/check`. The token is optional because the
    /// federated bootstrap calls it before any credential exists.
    async fn check(
        &self,
        request: &CheckRequest,
        token: Option<&BearerToken>,
    ) -> Result<CheckResponse, ApiError>;

    /// `GET /api/accommodation/get?email=...`
    async fn get_profile(
        &self,
        email: &str,
        token: &BearerToken,
    ) -> Result<AccommodationRecord, ApiError>;

    /// `GET /api/accommodation/get-image?email=...`, raw image bytes.
    async fn get_image(&self, email: &str, token: &BearerToken) -> Result<Vec<u8>, ApiError>;

    /// `POST /api/accommodation/upload-image` (multipart).
    async fn upload_image(
        &self,
        submission: &PhotoSubmission,
        token: &BearerToken,
    ) -> Result<UploadOutcome, ApiError>;

    /// `POST /api/accommodation/save-pass` (multipart).
    async fn save_pass(
        &self,
        pass: &EncodedPass,
        token: &BearerToken,
    ) -> Result<SavePassOutcome, ApiError>;

    /// Base URL used to resolve stored pass paths.
    fn api_base_url(&self) -> &str;
}
