//! `image`-crate adapters.

mod brand_assets;
mod pass_renderer;
mod photo_codec;

pub use brand_assets::FsBrandAssets;
pub use pass_renderer::RasterPassRenderer;
pub use photo_codec::{ImagePhotoCodec, JPEG_QUALITY};
