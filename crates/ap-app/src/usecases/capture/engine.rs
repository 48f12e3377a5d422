//! Capture engine.
//!
//! Executes [`CaptureStateMachine`] actions against the host camera. The
//! stream lives in a [`StreamSlot`] with a single release path, and a shared
//! [`CameraArbiter`] keeps at most one stream open across all engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use ap_core::capture::{
    CameraFacing, CaptureAction, CaptureEvent, CaptureStateMachine, PhotoValidationError,
    MAX_PHOTO_BYTES,
};
use ap_core::ports::{CameraPort, CameraStreamPort, PhotoCodecPort};
use ap_core::{CaptureState, CapturedPhoto, HardwareError, PhotoFormat, PhotoSource, Raster};

use crate::ViewScope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFailure {
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Validation(#[from] PhotoValidationError),

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("camera is not streaming")]
    NotStreaming,

    #[error("view dismissed")]
    Dismissed,
}

impl CaptureFailure {
    /// Every capture failure is local; the user can retry or pick a file.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CaptureFailure::Dismissed)
    }

    pub fn user_message(&self) -> String {
        match self {
            CaptureFailure::Hardware(err) => err.user_message().to_string(),
            CaptureFailure::Validation(PhotoValidationError::SizeExceeded { .. }) => {
                "Image too large (max 1MB). Move closer or retake the photo.".to_string()
            }
            CaptureFailure::Validation(err) => err.to_string(),
            CaptureFailure::Encode(_) => "Could not capture the photo. Please try again.".to_string(),
            CaptureFailure::NotStreaming => "Start the camera first.".to_string(),
            CaptureFailure::Dismissed => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// May tighten the 1 MiB ceiling, never relax it.
    pub max_photo_bytes: usize,
    pub facing: CameraFacing,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_photo_bytes: MAX_PHOTO_BYTES,
            facing: CameraFacing::User,
        }
    }
}

impl CaptureOptions {
    /// Options with a configured size limit, clamped to [`MAX_PHOTO_BYTES`].
    pub fn with_max_photo_bytes(max_photo_bytes: u64) -> Self {
        let ceiling = usize::try_from(max_photo_bytes)
            .unwrap_or(usize::MAX)
            .min(MAX_PHOTO_BYTES);
        Self {
            max_photo_bytes: ceiling,
            ..Self::default()
        }
    }

    fn ceiling(&self) -> usize {
        self.max_photo_bytes.min(MAX_PHOTO_BYTES)
    }
}

/// Process-wide camera ownership flag.
#[derive(Debug, Clone, Default)]
pub struct CameraArbiter {
    held: Arc<AtomicBool>,
}

impl CameraArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    fn try_lease(&self) -> Option<CameraLease> {
        self.held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CameraLease {
                held: self.held.clone(),
            })
    }
}

struct CameraLease {
    held: Arc<AtomicBool>,
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

/// Owner of the open stream.
#[derive(Default)]
struct StreamSlot {
    stream: Option<(Box<dyn CameraStreamPort>, CameraLease)>,
}

impl StreamSlot {
    fn adopt(&mut self, stream: Box<dyn CameraStreamPort>, lease: CameraLease) {
        self.release();
        self.stream = Some((stream, lease));
    }

    fn grab_frame(&mut self) -> Option<Result<Raster, HardwareError>> {
        self.stream.as_mut().map(|(stream, _)| stream.grab_frame())
    }

    /// Stop the held stream. A no-op when nothing is held.
    fn release(&mut self) {
        if let Some((mut stream, _lease)) = self.stream.take() {
            stream.stop();
            debug!("Camera stream released");
        }
    }

    fn is_held(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.release();
    }
}

struct EngineInner {
    state: CaptureState,
    slot: StreamSlot,
}

impl EngineInner {
    fn step(&mut self, event: CaptureEvent) -> Vec<CaptureAction> {
        let (next, actions) = CaptureStateMachine::transition(self.state.clone(), event);
        self.state = next;
        if actions.contains(&CaptureAction::ReleaseStream) {
            self.slot.release();
        }
        actions
    }
}

pub struct CaptureEngine {
    camera: Arc<dyn CameraPort>,
    codec: Arc<dyn PhotoCodecPort>,
    arbiter: CameraArbiter,
    options: CaptureOptions,
    inner: Mutex<EngineInner>,
}

impl CaptureEngine {
    pub fn new(
        camera: Arc<dyn CameraPort>,
        codec: Arc<dyn PhotoCodecPort>,
        arbiter: CameraArbiter,
        options: CaptureOptions,
    ) -> Self {
        Self {
            camera,
            codec,
            arbiter,
            options,
            inner: Mutex::new(EngineInner {
                state: CaptureState::Idle,
                slot: StreamSlot::default(),
            }),
        }
    }

    pub async fn state(&self) -> CaptureState {
        self.inner.lock().await.state.clone()
    }

    pub async fn photo(&self) -> Option<CapturedPhoto> {
        match &self.inner.lock().await.state {
            CaptureState::Captured(photo) => Some(photo.clone()),
            _ => None,
        }
    }

    pub async fn is_stream_held(&self) -> bool {
        self.inner.lock().await.slot.is_held()
    }

    /// Request the camera and start streaming.
    ///
    /// A stream that arrives after the view was dismissed or torn down is
    /// stopped immediately instead of being adopted.
    pub async fn start(&self, scope: &ViewScope) -> Result<CaptureState, CaptureFailure> {
        let span = info_span!("usecase.capture.start");

        async {
            {
                let mut inner = self.inner.lock().await;
                let actions = inner.step(CaptureEvent::Start);
                if !actions.contains(&CaptureAction::RequestCamera) {
                    return Ok(inner.state.clone());
                }
            }

            let Some(lease) = self.arbiter.try_lease() else {
                warn!("Another view holds the camera");
                let mut inner = self.inner.lock().await;
                inner.step(CaptureEvent::PermissionFailed(HardwareError::DeviceBusy));
                return Err(HardwareError::DeviceBusy.into());
            };

            let opened = self.camera.open(self.options.facing).await;
            let mut inner = self.inner.lock().await;

            match opened {
                Ok(mut stream) => {
                    if !scope.is_live() {
                        stream.stop();
                        inner.step(CaptureEvent::Teardown);
                        debug!("View dismissed during camera request, stream stopped");
                        return Err(CaptureFailure::Dismissed);
                    }
                    let actions = inner.step(CaptureEvent::PermissionGranted);
                    if actions.contains(&CaptureAction::AdoptStream) {
                        inner.slot.adopt(stream, lease);
                        info!("Camera streaming");
                    } else {
                        stream.stop();
                        debug!("Late camera grant dropped");
                    }
                    Ok(inner.state.clone())
                }
                Err(cause) => {
                    drop(lease);
                    warn!(error = %cause, "Camera request failed");
                    inner.step(CaptureEvent::PermissionFailed(cause.clone()));
                    Err(cause.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Snapshot the current frame into a JPEG photo.
    ///
    /// An oversized encode is rejected and the stream stays open.
    pub async fn capture(&self) -> Result<CapturedPhoto, CaptureFailure> {
        let mut inner = self.inner.lock().await;
        if inner.state != CaptureState::Streaming {
            return Err(CaptureFailure::NotStreaming);
        }

        let frame = match inner.slot.grab_frame() {
            Some(Ok(frame)) => frame,
            Some(Err(cause)) => {
                inner.step(CaptureEvent::StreamFailed(cause.clone()));
                return Err(cause.into());
            }
            None => {
                let cause = HardwareError::StreamInterrupted("no stream held".to_string());
                inner.step(CaptureEvent::StreamFailed(cause.clone()));
                return Err(cause.into());
            }
        };

        let bytes = match self.codec.encode_frame(&frame) {
            Ok(bytes) => bytes,
            Err(err) => {
                inner.step(CaptureEvent::FrameRejected);
                return Err(CaptureFailure::Encode(format!("{err:#}")));
            }
        };

        match CapturedPhoto::accept(
            bytes,
            Some(PhotoFormat::Jpeg),
            PhotoSource::Camera,
            self.options.ceiling(),
        ) {
            Ok(photo) => {
                info!(bytes = photo.len(), "Photo captured");
                inner.step(CaptureEvent::PhotoAccepted(photo.clone()));
                Ok(photo)
            }
            Err(err) => {
                warn!(error = %err, "Captured frame rejected");
                inner.step(CaptureEvent::FrameRejected);
                Err(err.into())
            }
        }
    }

    /// Second producer: a file picked from local storage.
    ///
    /// Rejected files leave the current state untouched.
    pub async fn select_file(&self, bytes: Vec<u8>) -> Result<CapturedPhoto, CaptureFailure> {
        let format = self.codec.detect_format(&bytes);
        let photo = CapturedPhoto::accept(
            bytes,
            format,
            PhotoSource::FilePicker,
            self.options.ceiling(),
        )?;

        let mut inner = self.inner.lock().await;
        inner.step(CaptureEvent::PhotoAccepted(photo.clone()));
        info!(bytes = photo.len(), format = ?photo.format(), "Photo selected from file");
        Ok(photo)
    }

    pub async fn retake(&self) {
        self.inner.lock().await.step(CaptureEvent::Retake);
    }

    /// Drop the photo after the backend accepted it.
    pub async fn discard_photo(&self) {
        self.inner.lock().await.step(CaptureEvent::Retake);
    }

    /// The view is going away.
    pub async fn teardown(&self) {
        self.inner.lock().await.step(CaptureEvent::Teardown);
    }
}
