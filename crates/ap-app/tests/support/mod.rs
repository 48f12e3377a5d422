//! In-memory port implementations shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ap_app::SessionManager;
use ap_core::accommodation::{PhotoSubmission, SavePassOutcome, UploadOutcome};
use ap_core::capture::CameraFacing;
use ap_core::identity::SecretToken;
use ap_core::pass::{EncodedPass, PassResources};
use ap_core::ports::{
    AccommodationBackendPort, ActivationSurfacePort, ApiError, AuthorityVerdict, BrandAssetPort,
    CameraPort, CameraStreamPort, ClockPort, OtpVerification, PassRendererPort, PhotoCodecPort,
    SessionStorePort, VerificationAuthorityPort,
};
use ap_core::session::TokenIssuer;
use ap_core::{
    AccommodationRecord, BearerToken, CheckRequest, CheckResponse, HardwareError, PhotoFormat,
    Raster, ScannableCode, SessionCredential,
};

pub const API_BASE: &str = "http://localhost:5000";
pub const REGISTRATION_URL: &str = "https://register.example.org/";

// ---------------------------------------------------------------- session

#[derive(Default)]
pub struct MemorySessionStore {
    pub saved: Mutex<Option<SessionCredential>>,
    pub fail_saves: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl SessionStorePort for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionCredential>> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save(&self, credential: &SessionCredential) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        *self.saved.lock().unwrap() = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.saved.lock().unwrap().take();
        Ok(())
    }
}

impl MemorySessionStore {
    pub fn stored(&self) -> Option<SessionCredential> {
        self.saved.lock().unwrap().clone()
    }
}

pub fn credential(email: &str, token: &str) -> SessionCredential {
    SessionCredential::new(email, BearerToken::new(token), TokenIssuer::Provider)
}

pub async fn session_with(
    credential: Option<SessionCredential>,
) -> (Arc<MemorySessionStore>, Arc<SessionManager>) {
    let store = Arc::new(MemorySessionStore::default());
    *store.saved.lock().unwrap() = credential;
    let manager = Arc::new(SessionManager::new(store.clone()));
    manager.init().await.unwrap();
    (store, manager)
}

// ---------------------------------------------------------------- backend

#[derive(Debug, Clone)]
pub struct CheckCall {
    pub request: CheckRequest,
    pub token: Option<String>,
}

pub struct FakeBackend {
    pub check_results: Mutex<VecDeque<Result<CheckResponse, ApiError>>>,
    pub profile_result: Mutex<Result<AccommodationRecord, ApiError>>,
    pub image_result: Mutex<Result<Vec<u8>, ApiError>>,
    pub image_delay: Mutex<Option<Duration>>,
    pub upload_result: Mutex<Result<UploadOutcome, ApiError>>,
    pub save_results: Mutex<VecDeque<Result<SavePassOutcome, ApiError>>>,
    pub check_calls: Mutex<Vec<CheckCall>>,
    pub profile_calls: AtomicUsize,
    pub upload_calls: Mutex<Vec<PhotoSubmission>>,
    pub save_calls: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            check_results: Mutex::new(VecDeque::new()),
            profile_result: Mutex::new(Ok(AccommodationRecord::default())),
            image_result: Mutex::new(Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])),
            image_delay: Mutex::new(None),
            upload_result: Mutex::new(Ok(UploadOutcome {
                ok: true,
                error: None,
            })),
            save_results: Mutex::new(VecDeque::new()),
            check_calls: Mutex::new(Vec::new()),
            profile_calls: AtomicUsize::new(0),
            upload_calls: Mutex::new(Vec::new()),
            save_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeBackend {
    pub fn push_check(&self, result: Result<CheckResponse, ApiError>) {
        self.check_results.lock().unwrap().push_back(result);
    }

    pub fn set_profile(&self, result: Result<AccommodationRecord, ApiError>) {
        *self.profile_result.lock().unwrap() = result;
    }

    pub fn set_upload(&self, result: Result<UploadOutcome, ApiError>) {
        *self.upload_result.lock().unwrap() = result;
    }

    pub fn push_save(&self, result: Result<SavePassOutcome, ApiError>) {
        self.save_results.lock().unwrap().push_back(result);
    }

    pub fn check_calls(&self) -> Vec<CheckCall> {
        self.check_calls.lock().unwrap().clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AccommodationBackendPort for FakeBackend {
    async fn check(
        &self,
        request: &CheckRequest,
        token: Option<&BearerToken>,
    ) -> Result<CheckResponse, ApiError> {
        self.check_calls.lock().unwrap().push(CheckCall {
            request: request.clone(),
            token: token.map(|t| t.expose().to_string()),
        });
        self.check_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no check response queued".into())))
    }

    async fn get_profile(
        &self,
        _email: &str,
        _token: &BearerToken,
    ) -> Result<AccommodationRecord, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile_result.lock().unwrap().clone()
    }

    async fn get_image(&self, _email: &str, _token: &BearerToken) -> Result<Vec<u8>, ApiError> {
        let delay = *self.image_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.image_result.lock().unwrap().clone()
    }

    async fn upload_image(
        &self,
        submission: &PhotoSubmission,
        _token: &BearerToken,
    ) -> Result<UploadOutcome, ApiError> {
        self.upload_calls.lock().unwrap().push(submission.clone());
        self.upload_result.lock().unwrap().clone()
    }

    async fn save_pass(
        &self,
        _pass: &EncodedPass,
        _token: &BearerToken,
    ) -> Result<SavePassOutcome, ApiError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.save_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no save response queued".into())))
    }

    fn api_base_url(&self) -> &str {
        API_BASE
    }
}

// ---------------------------------------------------------------- authority

pub struct FakeAuthority {
    pub verify_result: Mutex<Result<AuthorityVerdict, ApiError>>,
    pub send_result: Mutex<Result<(), ApiError>>,
    pub verify_otp_result: Mutex<Result<OtpVerification, ApiError>>,
    pub send_calls: Mutex<Vec<(String, String)>>,
}

impl Default for FakeAuthority {
    fn default() -> Self {
        Self {
            verify_result: Mutex::new(Ok(AuthorityVerdict::default())),
            send_result: Mutex::new(Ok(())),
            verify_otp_result: Mutex::new(Ok(OtpVerification::default())),
            send_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeAuthority {
    pub fn send_calls(&self) -> usize {
        self.send_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VerificationAuthorityPort for FakeAuthority {
    async fn verify(&self, _proof_token: &SecretToken) -> Result<AuthorityVerdict, ApiError> {
        self.verify_result.lock().unwrap().clone()
    }

    async fn send_otp(&self, email: &str, captcha_token: &SecretToken) -> Result<(), ApiError> {
        self.send_calls
            .lock()
            .unwrap()
            .push((email.to_string(), captcha_token.expose().to_string()));
        self.send_result.lock().unwrap().clone()
    }

    async fn verify_otp(
        &self,
        _email: &str,
        _code: &SecretToken,
    ) -> Result<OtpVerification, ApiError> {
        self.verify_otp_result.lock().unwrap().clone()
    }

    fn registration_url(&self) -> &str {
        REGISTRATION_URL
    }
}

// ---------------------------------------------------------------- clock

#[derive(Default)]
pub struct ManualClock {
    pub now: AtomicI64,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------- camera

/// Camera whose streams report into shared counters.
pub struct FakeCamera {
    pub open_result: Mutex<Option<HardwareError>>,
    pub open_delay: Mutex<Option<Duration>>,
    pub opened: Arc<AtomicUsize>,
    pub live: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl Default for FakeCamera {
    fn default() -> Self {
        Self {
            open_result: Mutex::new(None),
            open_delay: Mutex::new(None),
            opened: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeCamera {
    pub fn failing(cause: HardwareError) -> Self {
        let camera = Self::default();
        *camera.open_result.lock().unwrap() = Some(cause);
        camera
    }

    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraPort for FakeCamera {
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraStreamPort>, HardwareError> {
        assert_eq!(facing, CameraFacing::User);
        let delay = *self.open_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(cause) = self.open_result.lock().unwrap().clone() {
            return Err(cause);
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            live: self.live.clone(),
            stops: self.stops.clone(),
            stopped: false,
        }))
    }
}

pub struct FakeStream {
    live: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    stopped: bool,
}

impl CameraStreamPort for FakeStream {
    fn grab_frame(&mut self) -> Result<Raster, HardwareError> {
        if self.stopped {
            return Err(HardwareError::StreamInterrupted("stopped".into()));
        }
        Ok(Raster::new(2, 2, vec![128; 16]))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }
}

/// Codec that "encodes" every frame to a fixed number of bytes.
pub struct SizedCodec {
    pub encoded_len: AtomicUsize,
}

impl SizedCodec {
    pub fn producing(len: usize) -> Self {
        Self {
            encoded_len: AtomicUsize::new(len),
        }
    }
}

impl PhotoCodecPort for SizedCodec {
    fn encode_frame(&self, _frame: &Raster) -> Result<Vec<u8>> {
        Ok(vec![0xAB; self.encoded_len.load(Ordering::SeqCst)])
    }

    fn detect_format(&self, bytes: &[u8]) -> Option<PhotoFormat> {
        match bytes {
            [0xFF, 0xD8, ..] => Some(PhotoFormat::Jpeg),
            [0x89, b'P', b'N', b'G', ..] => Some(PhotoFormat::Png),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------- pass

#[derive(Default)]
pub struct FakeRenderer {
    pub empty_encode: std::sync::atomic::AtomicBool,
    pub rendered_with: Mutex<Vec<PassResources>>,
}

impl PassRendererPort for FakeRenderer {
    fn rasterize(
        &self,
        _record: &AccommodationRecord,
        resources: &PassResources,
        width: u32,
    ) -> Result<Raster> {
        self.rendered_with.lock().unwrap().push(resources.clone());
        Ok(Raster::new(width, 4, vec![255; (width * 4 * 4) as usize]))
    }

    fn encode(&self, _raster: &Raster) -> Result<EncodedPass> {
        if self.empty_encode.load(Ordering::SeqCst) {
            return Ok(EncodedPass { bytes: Vec::new() });
        }
        Ok(EncodedPass {
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

pub struct FakeBrand {
    pub result: Mutex<Option<Vec<u8>>>,
}

impl Default for FakeBrand {
    fn default() -> Self {
        Self {
            result: Mutex::new(Some(vec![1, 2, 3])),
        }
    }
}

#[async_trait]
impl BrandAssetPort for FakeBrand {
    async fn brand_mark(&self) -> Result<Vec<u8>> {
        self.result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("brand mark missing"))
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    pub shown: Mutex<Vec<ScannableCode>>,
}

impl RecordingSurface {
    pub fn last(&self) -> Option<ScannableCode> {
        self.shown.lock().unwrap().last().cloned()
    }

    pub fn all(&self) -> Vec<ScannableCode> {
        self.shown.lock().unwrap().clone()
    }
}

impl ActivationSurfacePort for RecordingSurface {
    fn show(&self, code: &ScannableCode) {
        self.shown.lock().unwrap().push(code.clone());
    }
}

pub fn uploaded_record(email: &str) -> AccommodationRecord {
    AccommodationRecord {
        name: "Asha Rao".into(),
        mi_no: "MI-ASH-1234".into(),
        college: "IIT Bombay".into(),
        email: email.into(),
        gender: "Female".into(),
        phone: "9000000000".into(),
        image_uploaded: true,
        ..Default::default()
    }
}
