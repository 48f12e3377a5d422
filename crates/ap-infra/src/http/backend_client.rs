//! Accommodation backend over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use ap_core::accommodation::{PhotoSubmission, SavePassOutcome, UploadOutcome};
use ap_core::pass::EncodedPass;
use ap_core::ports::{AccommodationBackendPort, ApiError};
use ap_core::{AccommodationRecord, BearerToken, CheckRequest, CheckResponse};

use super::error::{ensure_success, error_text, from_reqwest, from_status, is_auth_status};

const CHECK_PATH: &str = "/api/accommodation/check";
const GET_PATH: &str = "/api/accommodation/get";
const GET_IMAGE_PATH: &str = "/api/accommodation/get-image";
const UPLOAD_IMAGE_PATH: &str = "/api/accommodation/upload-image";
const SAVE_PASS_PATH: &str = "/api/accommodation/save-pass";

pub struct ReqwestAccommodationBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestAccommodationBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self::with_client(super::build_client(timeout)?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(from_reqwest)?;
        let response = ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Upload endpoints answer `{ok, ...}` even on failure statuses; only
    /// 401/403 and unreadable failure bodies become errors.
    async fn send_outcome<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<(StatusCode, T), ApiError> {
        let response = request.send().await.map_err(from_reqwest)?;
        let status = response.status();
        if is_auth_status(status) {
            return Err(from_status(status, String::new()));
        }
        let body = response.bytes().await.map_err(from_reqwest)?;
        match serde_json::from_slice::<T>(&body) {
            Ok(outcome) => Ok((status, outcome)),
            Err(err) if status.is_success() => Err(ApiError::Decode(err.to_string())),
            Err(_) => Err(from_status(status, error_text(&body, fallback))),
        }
    }
}

fn authorize(request: RequestBuilder, token: Option<&BearerToken>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token.expose()),
        None => request,
    }
}

/// Force `ok` to false for failure statuses that still carried a body.
fn failed_upload(status: StatusCode, mut outcome: UploadOutcome) -> UploadOutcome {
    if !status.is_success() {
        outcome.ok = false;
    }
    outcome
}

#[async_trait]
impl AccommodationBackendPort for ReqwestAccommodationBackend {
    #[instrument(skip_all, fields(email = %request.email, authenticated = token.is_some()))]
    async fn check(
        &self,
        request: &CheckRequest,
        token: Option<&BearerToken>,
    ) -> Result<CheckResponse, ApiError> {
        let builder = authorize(self.client.post(self.url(CHECK_PATH)).json(request), token);
        let response: CheckResponse = self.send_json(builder).await?;
        debug!(image_uploaded = response.image_uploaded, "Check answered");
        Ok(response)
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn get_profile(
        &self,
        email: &str,
        token: &BearerToken,
    ) -> Result<AccommodationRecord, ApiError> {
        let builder = self
            .client
            .get(self.url(GET_PATH))
            .query(&[("email", email)])
            .bearer_auth(token.expose());
        self.send_json(builder).await
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn get_image(&self, email: &str, token: &BearerToken) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.url(GET_IMAGE_PATH))
            .query(&[("email", email)])
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(from_reqwest)?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(from_reqwest)?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip_all, fields(bytes = submission.photo.len()))]
    async fn upload_image(
        &self,
        submission: &PhotoSubmission,
        token: &BearerToken,
    ) -> Result<UploadOutcome, ApiError> {
        let format = submission.photo.format();
        let photo = Part::bytes(submission.photo.bytes().to_vec())
            .file_name(format.file_name())
            .mime_str(format.mime_type())
            .map_err(from_reqwest)?;

        let mut form = Form::new().part("photo", photo);
        if let Some(govt_id) = &submission.govt_id {
            form = form
                .text("idType", govt_id.id_type.clone())
                .text("idNumber", govt_id.id_number.clone());
        }

        let builder = self
            .client
            .post(self.url(UPLOAD_IMAGE_PATH))
            .bearer_auth(token.expose())
            .multipart(form);

        match self.send_outcome::<UploadOutcome>(builder, "Upload failed").await {
            Ok((status, outcome)) => Ok(failed_upload(status, outcome)),
            Err(ApiError::Rejected { status, message }) if status < 500 => Ok(UploadOutcome {
                ok: false,
                error: Some(message),
            }),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip_all, fields(bytes = pass.bytes.len()))]
    async fn save_pass(
        &self,
        pass: &EncodedPass,
        token: &BearerToken,
    ) -> Result<SavePassOutcome, ApiError> {
        let part = Part::bytes(pass.bytes.clone())
            .file_name(EncodedPass::FILE_NAME)
            .mime_str(EncodedPass::MIME_TYPE)
            .map_err(from_reqwest)?;
        let builder = self
            .client
            .post(self.url(SAVE_PASS_PATH))
            .bearer_auth(token.expose())
            .multipart(Form::new().part("pass", part));

        let (status, mut outcome): (_, SavePassOutcome) =
            self.send_outcome(builder, "Failed to save pass").await?;
        outcome.ok = outcome.ok && status.is_success();
        Ok(outcome)
    }

    fn api_base_url(&self) -> &str {
        &self.base_url
    }
}
