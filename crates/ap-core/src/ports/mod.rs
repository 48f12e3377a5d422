//! Ports implemented by `ap-infra` and the adapter layer.

pub mod activation;
pub mod authority;
pub mod backend;
pub mod camera;
pub mod clock;
pub mod errors;
pub mod identity_provider;
pub mod pass_renderer;
pub mod photo_codec;
pub mod session_store;

pub use activation::ActivationSurfacePort;
pub use authority::{AuthorityVerdict, OtpVerification, VerificationAuthorityPort};
pub use backend::AccommodationBackendPort;
pub use camera::{CameraPort, CameraStreamPort};
pub use clock::ClockPort;
pub use errors::ApiError;
pub use identity_provider::{IdentityProviderError, IdentityProviderPort};
pub use pass_renderer::{BrandAssetPort, PassRendererPort};
pub use photo_codec::PhotoCodecPort;
pub use session_store::SessionStorePort;
