use thiserror::Error;

/// Which camera to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Front-facing ("user") camera.
    #[default]
    User,
    /// Rear-facing camera.
    Environment,
}

/// Camera acquisition and streaming failures, distinguished by cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera found")]
    DeviceNotFound,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("camera access is not supported on this device")]
    Unsupported,

    #[error("camera stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl HardwareError {
    /// Message shown inline next to the capture controls.
    pub fn user_message(&self) -> &'static str {
        match self {
            HardwareError::PermissionDenied => {
                "Camera permission denied. Allow camera access and try again, or choose a photo from your device."
            }
            HardwareError::DeviceNotFound => {
                "No camera was found. Connect a camera or choose a photo from your device."
            }
            HardwareError::DeviceBusy => {
                "The camera is being used by another application. Close it and try again."
            }
            HardwareError::Unsupported => {
                "Camera access is not supported here. Please choose a photo from your device."
            }
            HardwareError::StreamInterrupted(_) => {
                "The camera stopped unexpectedly. Please start it again."
            }
        }
    }
}
