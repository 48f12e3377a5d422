//! Host camera through `nokhwa`.
//!
//! The device handle is not `Send` on every backend, so each stream lives on
//! its own worker thread and is driven through a command channel.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::{Camera, NokhwaError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use ap_core::capture::CameraFacing;
use ap_core::ports::{CameraPort, CameraStreamPort};
use ap_core::{HardwareError, Raster};

use super::camera::{classify_failure, pick_device};

fn hardware_error(err: NokhwaError) -> HardwareError {
    match err {
        NokhwaError::UnsupportedOperationError(_) | NokhwaError::NotImplementedError(_) => {
            HardwareError::Unsupported
        }
        other => classify_failure(&other.to_string()),
    }
}

/// Camera port backed by the platform's native capture API.
#[derive(Debug)]
pub struct NativeCamera {
    devices: Vec<CameraIndex>,
}

impl NativeCamera {
    /// `None` when the host reports no capture device.
    pub fn detect() -> Option<Self> {
        let devices: Vec<CameraIndex> = match nokhwa::query(ApiBackend::Auto) {
            Ok(found) => found.iter().map(|info| info.index().clone()).collect(),
            Err(err) => {
                warn!(error = %err, "Camera enumeration failed");
                return None;
            }
        };
        if devices.is_empty() {
            info!("No camera device found");
            return None;
        }
        debug!(count = devices.len(), "Camera devices found");
        Some(Self { devices })
    }
}

#[async_trait]
impl CameraPort for NativeCamera {
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStreamPort>, HardwareError> {
        let index = pick_device(&self.devices, facing)
            .cloned()
            .ok_or(HardwareError::DeviceNotFound)?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let (commands, inbox) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("camera-stream".to_string())
            .spawn(move || run_stream(index, ready_tx, inbox))
            .map_err(|err| HardwareError::StreamInterrupted(err.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Box::new(NativeStream {
                commands: Some(commands),
                worker: Some(worker),
            })),
            Ok(Err(err)) => {
                let _ = worker.join();
                Err(err)
            }
            Err(_) => Err(HardwareError::StreamInterrupted(
                "camera worker exited".to_string(),
            )),
        }
    }
}

enum StreamCommand {
    Grab(mpsc::Sender<Result<Raster, HardwareError>>),
    Stop,
}

fn run_stream(
    index: CameraIndex,
    ready: oneshot::Sender<Result<(), HardwareError>>,
    inbox: mpsc::Receiver<StreamCommand>,
) {
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let opened = Camera::new(index, requested).and_then(|mut camera| {
        camera.open_stream()?;
        Ok(camera)
    });
    let mut camera = match opened {
        Ok(camera) => camera,
        Err(err) => {
            warn!(error = %err, "Camera open failed");
            let _ = ready.send(Err(hardware_error(err)));
            return;
        }
    };

    if ready.send(Ok(())).is_ok() {
        debug!("Camera stream open");
        // A dropped sender ends the stream the same way as an explicit stop.
        while let Ok(StreamCommand::Grab(reply)) = inbox.recv() {
            let _ = reply.send(grab(&mut camera));
        }
    }

    if let Err(err) = camera.stop_stream() {
        warn!(error = %err, "Camera stream did not stop cleanly");
    }
    debug!("Camera stream released");
}

fn grab(camera: &mut Camera) -> Result<Raster, HardwareError> {
    let frame = camera
        .frame()
        .map_err(|err| HardwareError::StreamInterrupted(err.to_string()))?;
    let rgb = frame
        .decode_image::<RgbFormat>()
        .map_err(|err| HardwareError::StreamInterrupted(err.to_string()))?;
    let (width, height) = rgb.dimensions();
    let rgba = rgb
        .into_raw()
        .chunks_exact(3)
        .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
        .collect();
    Ok(Raster::new(width, height, rgba))
}

struct NativeStream {
    commands: Option<mpsc::Sender<StreamCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl CameraStreamPort for NativeStream {
    fn grab_frame(&mut self) -> Result<Raster, HardwareError> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| HardwareError::StreamInterrupted("stream stopped".to_string()))?;
        let (reply_tx, reply_rx) = mpsc::channel();
        commands
            .send(StreamCommand::Grab(reply_tx))
            .map_err(|_| HardwareError::StreamInterrupted("camera worker exited".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| HardwareError::StreamInterrupted("camera worker exited".to_string()))?
    }

    fn stop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(StreamCommand::Stop);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Camera worker panicked");
            }
        }
    }

    fn is_live(&self) -> bool {
        self.commands.is_some()
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop();
    }
}
