use std::fmt;

use thiserror::Error;

/// Size ceiling for a verification photo (1 MiB).
pub const MAX_PHOTO_BYTES: usize = 1024 * 1024;

/// Image formats accepted for a verification photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
    Webp,
}

impl PhotoFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "image/jpeg",
            PhotoFormat::Png => "image/png",
            PhotoFormat::Webp => "image/webp",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "photo.jpg",
            PhotoFormat::Png => "photo.png",
            PhotoFormat::Webp => "photo.webp",
        }
    }
}

/// Which producer created the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource {
    /// Still frame snapshotted from the live camera stream.
    Camera,
    /// Image picked from local storage.
    FilePicker,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoValidationError {
    #[error("image is empty")]
    Empty,

    #[error("image too large ({size} bytes, max {max} bytes)")]
    SizeExceeded { size: usize, max: usize },

    #[error("unsupported image type (use JPEG, PNG or WebP)")]
    UnsupportedType,
}

/// A validated, transient verification photo.
///
/// Only constructible through [`CapturedPhoto::accept`], so every instance has
/// passed the size and type checks.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    bytes: Vec<u8>,
    format: PhotoFormat,
    source: PhotoSource,
}

impl CapturedPhoto {
    /// Apply the shared size/type validation of both producers.
    pub fn accept(
        bytes: Vec<u8>,
        format: Option<PhotoFormat>,
        source: PhotoSource,
        max_bytes: usize,
    ) -> Result<Self, PhotoValidationError> {
        if bytes.is_empty() {
            return Err(PhotoValidationError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(PhotoValidationError::SizeExceeded {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        let format = format.ok_or(PhotoValidationError::UnsupportedType)?;

        Ok(Self {
            bytes,
            format,
            source,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    pub fn source(&self) -> PhotoSource {
        self.source
    }
}

impl fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .field("source", &self.source)
            .finish()
    }
}
