//! Pass compositor.
//!
//! Renders the pass, uploads it, and activates the scannable code with the
//! backend-confirmed reference. Until a reference exists the activation
//! surface shows the placeholder.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use ap_core::pass::PassResources;
use ap_core::ports::{
    AccommodationBackendPort, ActivationSurfacePort, ApiError, BrandAssetPort, PassRendererPort,
};
use ap_core::{AccommodationRecord, BearerToken, PersistedReference, ScannableCode};

use crate::{SessionManager, ViewScope};

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("verification photo has not been uploaded")]
    NotUploaded,

    #[error("no profile loaded")]
    NotLoaded,

    #[error("pass generation already in progress")]
    Busy,

    #[error("not signed in")]
    Unauthenticated,

    #[error("session rejected by backend")]
    AuthRejected,

    #[error("failed to render pass: {0}")]
    Generation(String),

    #[error("pass was not stored: {0}")]
    Persist(String),

    #[error("network error: {0}")]
    Network(#[source] ApiError),

    #[error("view dismissed")]
    Dismissed,

    #[error("failed to update session: {0}")]
    Session(#[source] anyhow::Error),
}

impl PassError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PassError::Busy | PassError::Generation(_) | PassError::Persist(_) | PassError::Network(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            PassError::NotUploaded => "Upload your verification photo first.",
            PassError::NotLoaded => "Your profile is not loaded yet.",
            PassError::Busy => "Your pass is already being generated.",
            PassError::Unauthenticated | PassError::AuthRejected => {
                "Your session has expired. Please sign in again."
            }
            PassError::Generation(_) => "Could not render your pass. Please try again.",
            PassError::Persist(_) | PassError::Network(_) => {
                "Could not save your pass. Please try again."
            }
            PassError::Dismissed => "",
            PassError::Session(_) => "Could not update your session.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Generate once, after `settle_delay`, when the profile has no stored pass.
    pub auto_generate: bool,
    pub settle_delay: Duration,
    pub canonical_width: u32,
    /// Upper bound for loading each image resource of the layout.
    pub resource_timeout: Duration,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            auto_generate: true,
            settle_delay: Duration::from_millis(800),
            canonical_width: 1080,
            resource_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Default)]
struct CompositorState {
    record: Option<AccommodationRecord>,
    reference: Option<PersistedReference>,
}

/// Resets the in-flight flag when the attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PassCompositor {
    backend: Arc<dyn AccommodationBackendPort>,
    renderer: Arc<dyn PassRendererPort>,
    brand: Arc<dyn BrandAssetPort>,
    surface: Arc<dyn ActivationSurfacePort>,
    session: Arc<SessionManager>,
    options: PassOptions,
    state: Mutex<CompositorState>,
    in_flight: AtomicBool,
    auto_attempted: AtomicBool,
}

impl PassCompositor {
    pub fn new(
        backend: Arc<dyn AccommodationBackendPort>,
        renderer: Arc<dyn PassRendererPort>,
        brand: Arc<dyn BrandAssetPort>,
        surface: Arc<dyn ActivationSurfacePort>,
        session: Arc<SessionManager>,
        options: PassOptions,
    ) -> Self {
        Self {
            backend,
            renderer,
            brand,
            surface,
            session,
            options,
            state: Mutex::new(CompositorState::default()),
            in_flight: AtomicBool::new(false),
            auto_attempted: AtomicBool::new(false),
        }
    }

    /// Take the profile confirmed by the gate.
    ///
    /// A stored pass path is activated right away without any upload.
    pub async fn load(&self, record: AccommodationRecord) -> Result<ScannableCode, PassError> {
        if !record.image_uploaded {
            self.surface.show(&ScannableCode::Placeholder);
            return Err(PassError::NotUploaded);
        }

        let existing = record
            .persisted_pass_path()
            .and_then(|path| PersistedReference::resolve(self.backend.api_base_url(), path));
        self.state.lock().await.record = Some(record);

        match existing {
            Some(reference) => {
                info!(reference = %reference, "Stored pass found, activating");
                Ok(self.activate(reference).await)
            }
            None => {
                self.surface.show(&ScannableCode::Placeholder);
                Ok(ScannableCode::Placeholder)
            }
        }
    }

    /// Encode `reference` in the scannable code.
    pub async fn activate(&self, reference: PersistedReference) -> ScannableCode {
        let code = ScannableCode::Active(reference.clone());
        self.state.lock().await.reference = Some(reference);
        self.surface.show(&code);
        code
    }

    pub async fn current_code(&self) -> ScannableCode {
        match &self.state.lock().await.reference {
            Some(reference) => ScannableCode::Active(reference.clone()),
            None => ScannableCode::Placeholder,
        }
    }

    pub async fn record(&self) -> Option<AccommodationRecord> {
        self.state.lock().await.record.clone()
    }

    /// Automatic trigger. Runs at most once per compositor, after the settle
    /// delay, and only for an uploaded profile without a stored pass.
    pub async fn auto_generate(
        &self,
        scope: &ViewScope,
    ) -> Option<Result<PersistedReference, PassError>> {
        if !self.options.auto_generate || self.auto_attempted.swap(true, Ordering::SeqCst) {
            return None;
        }

        {
            let state = self.state.lock().await;
            let eligible = state.reference.is_none()
                && state
                    .record
                    .as_ref()
                    .is_some_and(|record| record.image_uploaded);
            if !eligible {
                return None;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(self.options.settle_delay) => {}
            _ = scope.dismissed() => {
                debug!("View dismissed during settle delay");
                return None;
            }
        }

        Some(self.generate(scope).await)
    }

    /// Render, encode and upload the pass, then activate the stored reference.
    pub async fn generate(&self, scope: &ViewScope) -> Result<PersistedReference, PassError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Err(PassError::Busy);
        };
        let span = info_span!("usecase.pass.generate");

        let result = async {
            let record = {
                let state = self.state.lock().await;
                if let Some(reference) = &state.reference {
                    debug!("Pass already stored, skipping generation");
                    return Ok(reference.clone());
                }
                state.record.clone().ok_or(PassError::NotLoaded)?
            };
            if !record.image_uploaded {
                return Err(PassError::NotUploaded);
            }

            let credential = self
                .session
                .current()
                .await
                .ok_or(PassError::Unauthenticated)?;

            let resources = self
                .load_resources(&record.email, &credential.bearer_token)
                .await;
            let encoded = {
                let raster = self
                    .renderer
                    .rasterize(&record, &resources, self.options.canonical_width)
                    .map_err(|err| PassError::Generation(format!("{err:#}")))?;
                if !raster.is_well_formed() {
                    return Err(PassError::Generation("empty surface".to_string()));
                }
                self.renderer
                    .encode(&raster)
                    .map_err(|err| PassError::Generation(format!("{err:#}")))?
            };
            if encoded.bytes.is_empty() {
                return Err(PassError::Generation("encoder produced no bytes".to_string()));
            }
            debug!(bytes = encoded.bytes.len(), "Pass encoded");

            let outcome = match self.backend.save_pass(&encoded, &credential.bearer_token).await {
                Ok(outcome) => outcome,
                Err(ApiError::AuthRejected { status }) => {
                    warn!(status, "Pass upload rejected as unauthorized, clearing session");
                    self.session.clear().await.map_err(PassError::Session)?;
                    return Err(PassError::AuthRejected);
                }
                Err(ApiError::Rejected { message, .. }) => return Err(PassError::Persist(message)),
                Err(err) => return Err(PassError::Network(err)),
            };

            let path = outcome
                .persisted_path()
                .ok_or_else(|| PassError::Persist("backend did not confirm storage".to_string()))?
                .to_string();
            let reference = PersistedReference::resolve(self.backend.api_base_url(), &path)
                .ok_or_else(|| PassError::Persist(format!("unusable stored path {path:?}")))?;

            if !scope.is_live() {
                debug!("View dismissed before pass was stored, not activating");
                return Err(PassError::Dismissed);
            }

            if let Some(record) = self.state.lock().await.record.as_mut() {
                record.pass_image_path = Some(path);
            }
            info!(reference = %reference, "Pass stored");
            self.activate(reference.clone()).await;
            Ok(reference)
        }
        .instrument(span)
        .await;

        if let Err(err) = &result {
            if !matches!(err, PassError::Busy | PassError::Dismissed) {
                warn!(error = %err, "Pass generation failed");
                self.surface.show(&self.current_code().await);
            }
        }
        result
    }

    /// Photo and brand mark, loaded together. A failed or slow resource is
    /// left out of the layout.
    async fn load_resources(&self, email: &str, token: &BearerToken) -> PassResources {
        let limit = self.options.resource_timeout;
        let (photo, brand_mark) = tokio::join!(
            bounded("photo", limit, async {
                self.backend
                    .get_image(email, token)
                    .await
                    .map_err(anyhow::Error::from)
            }),
            bounded("brand_mark", limit, self.brand.brand_mark()),
        );
        PassResources { photo, brand_mark }
    }
}

async fn bounded<F>(resource: &'static str, limit: Duration, load: F) -> Option<Vec<u8>>
where
    F: Future<Output = anyhow::Result<Vec<u8>>>,
{
    match tokio::time::timeout(limit, load).await {
        Ok(Ok(bytes)) if !bytes.is_empty() => Some(bytes),
        Ok(Ok(_)) => {
            warn!(resource, "Resource is empty, omitting");
            None
        }
        Ok(Err(err)) => {
            warn!(resource, error = %err, "Resource failed to load, omitting");
            None
        }
        Err(_) => {
            warn!(resource, "Resource load timed out, omitting");
            None
        }
    }
}
