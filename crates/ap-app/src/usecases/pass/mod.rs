pub mod compositor;

pub use compositor::{PassCompositor, PassError, PassOptions};
