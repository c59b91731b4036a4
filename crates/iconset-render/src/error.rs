//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while decoding images and animations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The bytes could not be decoded as any supported image format.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    /// An XPM document was malformed.
    #[error("invalid XPM data: {0}")]
    Xpm(String),

    /// An SVG document could not be parsed or rasterised.
    #[error("invalid SVG data: {0}")]
    Svg(String),

    /// An animation was requested but the data holds no frames.
    #[error("animation contains no frames")]
    NoFrames,

    /// Raw pixel data does not match the stated dimensions.
    #[error("invalid image dimensions: {width}x{height} with {len} bytes")]
    InvalidDimensions { width: u32, height: u32, len: usize },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
