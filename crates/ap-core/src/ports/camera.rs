use async_trait::async_trait;

use crate::capture::{CameraFacing, HardwareError};
use crate::raster::Raster;

/// Host camera access.
#[async_trait]
pub trait CameraPort: Send + Sync {
    /// Acquire a live stream. The returned stream is owned by the caller and
    /// must be stopped by it.
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStreamPort>, HardwareError>;
}

/// A live camera stream holding hardware.
pub trait CameraStreamPort: Send + Sync {
    /// Snapshot the current frame.
    fn grab_frame(&mut self) -> Result<Raster, HardwareError>;

    /// Release the hardware. Must be idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}
