//! Accommodation domain module.
//!
//! The accommodation record is owned by the backend. The client only keeps a
//! read-only copy per stage entry, refreshed every time a stage is entered.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::capture::CapturedPhoto;
use crate::identity::ProfileHints;
use crate::session::BearerToken;

/// The backend sends `null` for fields it has not filled in yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend-owned accommodation record, as returned by `GET /api/accommodation/get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccommodationRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mi_no: String,
    #[serde(deserialize_with = "null_as_default")]
    pub college: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub govt_id_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub govt_id_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_uploaded: bool,
    pub pass_image_path: Option<String>,
}

impl AccommodationRecord {
    /// The record carries a persisted pass path.
    pub fn persisted_pass_path(&self) -> Option<&str> {
        self.pass_image_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// Body of `POST /api/accommodation/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mi_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CheckRequest {
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    /// Forward the authority's profile hints to the backend.
    pub fn with_hints(mut self, hints: &ProfileHints) -> Self {
        self.name = Some(hints.name.clone());
        self.mi_no = Some(hints.mi_no.clone());
        self.college = Some(hints.college.clone());
        self.gender = Some(hints.gender.clone());
        self.phone = Some(hints.phone.clone());
        self
    }
}

/// Response of `POST /api/accommodation/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckResponse {
    pub token: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mi_no: String,
    #[serde(deserialize_with = "null_as_default")]
    pub college: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_uploaded: bool,
}

impl CheckResponse {
    /// Backend-issued token, if the response carried a non-empty one.
    pub fn backend_token(&self) -> Option<BearerToken> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(BearerToken::new)
    }

    /// Snapshot of the record as seen by the check call. Fields the check
    /// does not return stay empty.
    pub fn to_record(&self, email: &str) -> AccommodationRecord {
        AccommodationRecord {
            name: self.name.clone(),
            mi_no: self.mi_no.clone(),
            college: self.college.clone(),
            email: email.to_string(),
            gender: self.gender.clone(),
            phone: self.phone.clone(),
            image_uploaded: self.image_uploaded,
            ..Default::default()
        }
    }
}

/// Response of `POST /api/accommodation/upload-image`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadOutcome {
    #[serde(deserialize_with = "null_as_default")]
    pub ok: bool,
    pub error: Option<String>,
}

/// Response of `POST /api/accommodation/save-pass`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SavePassOutcome {
    #[serde(deserialize_with = "null_as_default")]
    pub ok: bool,
    pub url: Option<String>,
}

impl SavePassOutcome {
    /// The saved path, only when the backend acknowledged durable storage.
    pub fn persisted_path(&self) -> Option<&str> {
        if !self.ok {
            return None;
        }
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovtIdError {
    #[error("please select an ID type")]
    MissingType,

    #[error("please enter your ID number")]
    MissingNumber,

    #[error("ID number may only contain letters, digits, spaces and hyphens (4-32 characters)")]
    InvalidNumber,
}

/// Government ID attached to a photo submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovtId {
    pub id_type: String,
    pub id_number: String,
}

impl GovtId {
    pub fn parse(id_type: &str, id_number: &str) -> Result<Self, GovtIdError> {
        let id_type = id_type.trim();
        if id_type.is_empty() {
            return Err(GovtIdError::MissingType);
        }

        let id_number = id_number.trim();
        if id_number.is_empty() {
            return Err(GovtIdError::MissingNumber);
        }

        let well_formed = (4..=32).contains(&id_number.chars().count())
            && id_number
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ' ');
        if !well_formed {
            return Err(GovtIdError::InvalidNumber);
        }

        Ok(Self {
            id_type: id_type.to_string(),
            id_number: id_number.to_string(),
        })
    }
}

/// Multipart payload of `POST /api/accommodation/upload-image`.
#[derive(Debug, Clone)]
pub struct PhotoSubmission {
    pub photo: CapturedPhoto,
    pub govt_id: Option<GovtId>,
}
