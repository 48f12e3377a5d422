//! Terminal-side implementations of the presentation ports.

use std::sync::Arc;

use ap_core::ports::CameraPort;

mod activation;
mod camera;
mod identity_provider;
#[cfg(feature = "camera")]
mod native_camera;

pub use activation::{render_symbol, TerminalActivationSurface};
pub use camera::UnavailableCamera;
pub use identity_provider::SuppliedAssertionProvider;
#[cfg(feature = "camera")]
pub use native_camera::NativeCamera;

/// The host camera, or [`UnavailableCamera`] when none is present.
#[cfg(feature = "camera")]
pub fn host_camera() -> Arc<dyn CameraPort> {
    match NativeCamera::detect() {
        Some(camera) => Arc::new(camera),
        None => Arc::new(UnavailableCamera),
    }
}

/// Built without camera support.
#[cfg(not(feature = "camera"))]
pub fn host_camera() -> Arc<dyn CameraPort> {
    Arc::new(UnavailableCamera)
}
