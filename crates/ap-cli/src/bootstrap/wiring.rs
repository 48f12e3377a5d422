//! # Dependency wiring
//!
//! The only place that depends on `ap-infra`, `ap-app` and the terminal
//! adapters at once. It assembles; it does not decide.

use std::sync::Arc;
use std::time::Duration;

use ap_app::usecases::{
    CameraArbiter, CaptureEngine, CaptureOptions, GateController, IdentityAcquirer, OtpFlow,
    PassCompositor, PassOptions, SignOut, SubmitVerificationPhoto,
};
use ap_app::SessionManager;
use ap_core::config::AppConfig;
use ap_core::ports::*;
use ap_infra::{
    FileSessionStore, FsBrandAssets, ImagePhotoCodec, RasterPassRenderer,
    ReqwestAccommodationBackend, ReqwestVerificationAuthority, SystemClock,
};

use crate::adapters::{host_camera, SuppliedAssertionProvider};

pub type WiringResult<T> = Result<T, WiringError>;

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(String),

    #[error("Session store initialization failed: {0}")]
    SessionStore(String),
}

/// Ports and shared state for one process.
pub struct Portal {
    config: AppConfig,
    backend: Arc<dyn AccommodationBackendPort>,
    authority: Arc<dyn VerificationAuthorityPort>,
    session: Arc<SessionManager>,
    clock: Arc<dyn ClockPort>,
    camera: Arc<dyn CameraPort>,
    codec: Arc<dyn PhotoCodecPort>,
    arbiter: CameraArbiter,
    renderer: Arc<dyn PassRendererPort>,
    brand: Arc<dyn BrandAssetPort>,
}

/// Build every adapter from `config` and load the persisted session.
pub async fn wire_portal(config: AppConfig) -> WiringResult<Portal> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let backend = ReqwestAccommodationBackend::new(config.api_base_url.clone(), timeout)
        .map_err(|e| WiringError::HttpClient(format!("{e:#}")))?;
    let authority = ReqwestVerificationAuthority::new(
        config.authority_base_url.clone(),
        config.registration_url.clone(),
        timeout,
    )
    .map_err(|e| WiringError::HttpClient(format!("{e:#}")))?;

    let store: Arc<dyn SessionStorePort> =
        Arc::new(FileSessionStore::new(config.session_path.clone()));
    let session = Arc::new(SessionManager::new(store));
    session
        .init()
        .await
        .map_err(|e| WiringError::SessionStore(format!("{e:#}")))?;

    Ok(Portal {
        backend: Arc::new(backend),
        authority: Arc::new(authority),
        session,
        clock: Arc::new(SystemClock),
        camera: host_camera(),
        codec: Arc::new(ImagePhotoCodec::default()),
        arbiter: CameraArbiter::new(),
        renderer: Arc::new(RasterPassRenderer::new()),
        brand: Arc::new(FsBrandAssets::new(config.brand_mark_path.clone())),
        config,
    })
}

impl Portal {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> Arc<SessionManager> {
        self.session.clone()
    }

    pub fn identity_acquirer(&self, provider: Arc<dyn IdentityProviderPort>) -> Arc<IdentityAcquirer> {
        Arc::new(IdentityAcquirer::new(
            provider,
            self.authority.clone(),
            self.backend.clone(),
            self.session.clone(),
        ))
    }

    pub fn otp_flow(&self) -> OtpFlow {
        let acquirer = self.identity_acquirer(Arc::new(SuppliedAssertionProvider::none()));
        OtpFlow::new(self.authority.clone(), acquirer, self.clock.clone())
    }

    pub fn gate(&self) -> GateController {
        GateController::new(self.backend.clone(), self.session.clone())
    }

    pub fn capture_engine(&self) -> CaptureEngine {
        let options = CaptureOptions::with_max_photo_bytes(self.config.max_photo_bytes);
        CaptureEngine::new(
            self.camera.clone(),
            self.codec.clone(),
            self.arbiter.clone(),
            options,
        )
    }

    pub fn submit_photo(&self) -> SubmitVerificationPhoto {
        SubmitVerificationPhoto::new(
            self.backend.clone(),
            self.session.clone(),
            self.config.require_govt_id,
        )
    }

    pub fn pass_compositor(&self, surface: Arc<dyn ActivationSurfacePort>) -> PassCompositor {
        let options = PassOptions {
            auto_generate: self.config.auto_generate_pass,
            settle_delay: Duration::from_millis(self.config.settle_delay_ms),
            canonical_width: self.config.canonical_width,
            resource_timeout: Duration::from_millis(self.config.resource_timeout_ms),
        };
        PassCompositor::new(
            self.backend.clone(),
            self.renderer.clone(),
            self.brand.clone(),
            surface,
            self.session.clone(),
            options,
        )
    }

    pub fn sign_out(&self) -> SignOut {
        SignOut::new(self.session.clone())
    }
}
