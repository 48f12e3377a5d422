use async_trait::async_trait;

use ap_core::capture::CameraFacing;
use ap_core::ports::{CameraPort, CameraStreamPort};
use ap_core::HardwareError;

/// Camera port for hosts without capture support. Every request fails with
/// [`HardwareError::Unsupported`] so the caller falls back to a file.
#[derive(Debug, Default)]
pub struct UnavailableCamera;

#[async_trait]
impl CameraPort for UnavailableCamera {
    async fn open(&self, _facing: CameraFacing) -> Result<Box<dyn CameraStreamPort>, HardwareError> {
        Err(HardwareError::Unsupported)
    }
}

/// Desktop devices report no facing. The first enumerated device stands in
/// for the user-facing camera, the last one for the rear camera.
#[cfg_attr(not(feature = "camera"), allow(dead_code))]
pub(crate) fn pick_device<T>(devices: &[T], facing: CameraFacing) -> Option<&T> {
    match facing {
        CameraFacing::User => devices.first(),
        CameraFacing::Environment => devices.last(),
    }
}

/// Map a backend failure message onto a hardware cause. Platform backends
/// only report free-form text (V4L2 errno strings, AVFoundation and Media
/// Foundation messages).
#[cfg_attr(not(feature = "camera"), allow(dead_code))]
pub(crate) fn classify_failure(message: &str) -> HardwareError {
    const DENIED: [&str; 4] = ["permission", "denied", "not authorized", "unauthorized"];
    const BUSY: [&str; 4] = ["busy", "in use", "temporarily unavailable", "already open"];
    const ABSENT: [&str; 4] = ["no such device", "not found", "no device", "out of range"];
    const UNSUPPORTED: [&str; 3] = ["not supported", "unsupported", "not implemented"];

    let lowered = message.to_ascii_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));

    if mentions(&DENIED) {
        HardwareError::PermissionDenied
    } else if mentions(&BUSY) {
        HardwareError::DeviceBusy
    } else if mentions(&ABSENT) {
        HardwareError::DeviceNotFound
    } else if mentions(&UNSUPPORTED) {
        HardwareError::Unsupported
    } else {
        HardwareError::StreamInterrupted(message.to_string())
    }
}
