use async_trait::async_trait;

use crate::accommodation::AccommodationRecord;
use crate::pass::{EncodedPass, PassResources};
use crate::raster::Raster;

/// Lays out and encodes the pass.
pub trait PassRendererPort: Send + Sync {
    /// Render the pass layout at `width` pixels. Missing resources are omitted.
    fn rasterize(
        &self,
        record: &AccommodationRecord,
        resources: &PassResources,
        width: u32,
    ) -> anyhow::Result<Raster>;

    fn encode(&self, raster: &Raster) -> anyhow::Result<EncodedPass>;
}

/// Source of the static brand mark drawn on the pass.
#[async_trait]
pub trait BrandAssetPort: Send + Sync {
    async fn brand_mark(&self) -> anyhow::Result<Vec<u8>>;
}
