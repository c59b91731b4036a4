//! Still and animated image decoding for iconset.
//!
//! This crate turns the raw bytes referenced by an icon manifest into pixels:
//!
//! - [`PixelImage`] - an immutable RGBA image decoded from PNG, GIF, BMP,
//!   JPEG, XPM or SVG data
//! - [`AnimatedImage`] - a GIF decoded into composed frames with delays
//! - [`AnimationController`] - a playback position advanced by elapsed time
//!
//! # Example
//!
//! ```ignore
//! use iconset_render::{AnimatedImage, PixelImage};
//!
//! let still = PixelImage::from_bytes(&png_bytes)?;
//! let animated = AnimatedImage::from_bytes(&gif_bytes)?;
//! assert_eq!(animated.first_image().width(), still.width());
//! ```

mod animated_image;
mod error;
mod pixel_image;
mod svg;
pub mod xpm;

pub use animated_image::{
    AnimatedImage, AnimationController, AnimationFrame, DEFAULT_FRAME_DELAY, PlaybackState,
};
pub use error::{RenderError, RenderResult};
pub use pixel_image::PixelImage;
pub use svg::SvgImage;
