//! Access Pass infrastructure layer
//!
//! Implements the `ap-core` ports: reqwest clients for the accommodation
//! backend and the verification authority, the JSON file session store, the
//! `image`-based photo codec and pass renderer, and the system clock.

pub mod http;
pub mod imaging;
pub mod session;
pub mod time;

pub use http::{ReqwestAccommodationBackend, ReqwestVerificationAuthority};
pub use imaging::{FsBrandAssets, ImagePhotoCodec, RasterPassRenderer};
pub use session::FileSessionStore;
pub use time::SystemClock;
