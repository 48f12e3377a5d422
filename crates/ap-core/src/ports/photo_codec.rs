use crate::capture::PhotoFormat;
use crate::raster::Raster;

/// Still-image encoding for camera frames and type sniffing for picked files.
pub trait PhotoCodecPort: Send + Sync {
    /// Encode a frame as JPEG at the configured quality.
    fn encode_frame(&self, frame: &Raster) -> anyhow::Result<Vec<u8>>;

    /// Detect the image type from content. `None` for anything unsupported.
    fn detect_format(&self, bytes: &[u8]) -> Option<PhotoFormat>;
}
