//! Error types for capture image operations
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisualError {
    /// Baked-in placeholder or font could not be loaded
    #[error("fallback asset error: {0}")]
    Asset(String),

    #[error("image processing error: {0}")]
    ImageProcessing(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for VisualError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing(err.to_string())
    }
}

impl From<png::EncodingError> for VisualError {
    fn from(err: png::EncodingError) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<png::DecodingError> for VisualError {
    fn from(err: png::DecodingError) -> Self {
        Self::ImageProcessing(err.to_string())
    }
}
