//! Image side of a capture: the fallback placeholder, post-processing,
//! encoding and on-disk inspection.

pub mod assets;
pub mod encode;
pub mod errors;
pub mod fallback;
pub mod inspect;
pub mod postprocess;

pub use assets::FallbackAssets;
pub use encode::{encode, EncodeOptions};
pub use errors::VisualError;
pub use fallback::{generate_fallback, FALLBACK_WRAP_WIDTH};
pub use inspect::{inspect, ImageDetails};
pub use postprocess::PostProcess;
