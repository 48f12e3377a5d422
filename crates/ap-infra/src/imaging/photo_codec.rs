use anyhow::{ensure, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, RgbaImage};

use ap_core::ports::PhotoCodecPort;
use ap_core::{PhotoFormat, Raster};

pub const JPEG_QUALITY: u8 = 90;

pub struct ImagePhotoCodec {
    quality: u8,
}

impl ImagePhotoCodec {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for ImagePhotoCodec {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl PhotoCodecPort for ImagePhotoCodec {
    fn encode_frame(&self, frame: &Raster) -> Result<Vec<u8>> {
        ensure!(frame.is_well_formed(), "frame buffer does not match {frame:?}");

        let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
            .context("frame buffer too small")?;
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8.into())
            .context("encode frame to jpeg")?;
        Ok(bytes)
    }

    fn detect_format(&self, bytes: &[u8]) -> Option<PhotoFormat> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(PhotoFormat::Jpeg),
            ImageFormat::Png => Some(PhotoFormat::Png),
            ImageFormat::WebP => Some(PhotoFormat::Webp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> Raster {
        let rgba = (0..width * height)
            .flat_map(|i| [(i % 255) as u8, 40, 200, 255])
            .collect();
        Raster::new(width, height, rgba)
    }

    #[test]
    fn test_encode_frame_produces_jpeg() {
        let codec = ImagePhotoCodec::default();

        let bytes = codec.encode_frame(&frame(32, 24)).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(codec.detect_format(&bytes), Some(PhotoFormat::Jpeg));
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let source = frame(64, 64);

        let high = ImagePhotoCodec::new(95).encode_frame(&source).unwrap();
        let low = ImagePhotoCodec::new(10).encode_frame(&source).unwrap();

        assert!(low.len() <= high.len());
    }

    #[test]
    fn test_malformed_frame_is_rejected() {
        let codec = ImagePhotoCodec::default();

        assert!(codec.encode_frame(&Raster::new(4, 4, vec![0; 3])).is_err());
    }

    #[test]
    fn test_detect_format_rejects_unknown_bytes() {
        let codec = ImagePhotoCodec::default();

        assert_eq!(codec.detect_format(b"GIF89a......"), None);
        assert_eq!(codec.detect_format(b"plain text"), None);
    }
}
