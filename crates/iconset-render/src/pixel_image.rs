//! Decoded still images.
//!
//! This module provides [`PixelImage`], an immutable, cheaply clonable RGBA
//! image. A `PixelImage` may be *null* (no pixels at all), which is what an
//! icon without image data reports.
//!
//! # Example
//!
//! ```ignore
//! use iconset_render::PixelImage;
//!
//! let image = PixelImage::from_bytes(&png_data)?;
//! println!("{}x{}", image.width(), image.height());
//! ```

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};

use crate::error::{RenderError, RenderResult};
use crate::svg::{SvgImage, looks_like_svg};
use crate::xpm;

/// An immutable RGBA image.
///
/// Clones share the pixel buffer. Equality compares dimensions and pixels.
#[derive(Clone, Default)]
pub struct PixelImage {
    pixels: Option<Arc<RgbaImage>>,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl PixelImage {
    /// The null image: no pixels, 0x0.
    pub fn null() -> Self {
        Self { pixels: None }
    }

    /// Decode an image from bytes in memory.
    ///
    /// Raster formats (PNG, GIF, BMP, JPEG) are detected from their content.
    /// XPM and SVG documents are recognised from their headers; SVG is
    /// rasterised at its natural size. For GIF data only the first frame is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a decodable image.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        if xpm::looks_like_xpm(data) {
            return xpm::decode(data);
        }
        if looks_like_svg(data) {
            return SvgImage::from_bytes(data)?.to_pixel_image();
        }

        let image = image::load_from_memory(data)
            .map_err(|e| RenderError::ImageLoad(format!("Failed to decode image: {}", e)))?;
        Ok(Self::from_dynamic(image))
    }

    /// Create an image from straight-alpha RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidDimensions`] if `data` does not hold
    /// exactly `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let len = data.len();
        RgbaImage::from_raw(width, height, data)
            .filter(|_| len == width as usize * height as usize * 4)
            .map(Self::from_rgba_image)
            .ok_or(RenderError::InvalidDimensions { width, height, len })
    }

    /// Create a solid-colour image.
    pub fn from_color(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_rgba_image(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    /// Wrap an already decoded RGBA buffer.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        if image.width() == 0 || image.height() == 0 {
            return Self::null();
        }
        Self {
            pixels: Some(Arc::new(image)),
        }
    }

    /// Convert any decoded image to RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_rgba_image(image.into_rgba8())
    }
}

// ============================================================================
// ACCESSORS
// ============================================================================

impl PixelImage {
    /// Whether this image holds no pixels.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.pixels.is_none()
    }

    /// Width in pixels (0 for the null image).
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.width())
    }

    /// Height in pixels (0 for the null image).
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.height())
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Raw RGBA bytes, row-major. Empty for the null image.
    pub fn rgba_bytes(&self) -> &[u8] {
        self.pixels.as_ref().map_or(&[], |p| p.as_raw().as_slice())
    }

    /// The RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let pixels = self.pixels.as_ref()?;
        if x >= pixels.width() || y >= pixels.height() {
            return None;
        }
        Some(pixels.get_pixel(x, y).0)
    }

    /// Borrow the underlying `image` buffer.
    pub fn as_rgba_image(&self) -> Option<&RgbaImage> {
        self.pixels.as_deref()
    }

    /// Whether both images share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.pixels, &other.pixels) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for PixelImage {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.dimensions() == other.dimensions() && self.rgba_bytes() == other.rgba_bytes())
    }
}

impl Eq for PixelImage {}

impl std::fmt::Debug for PixelImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return f.write_str("PixelImage(null)");
        }
        f.debug_struct("PixelImage")
            .field("dimensions", &format!("{}x{}", self.width(), self.height()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn test_null_image() {
        let image = PixelImage::null();
        assert!(image.is_null());
        assert_eq!(image.dimensions(), (0, 0));
        assert!(image.rgba_bytes().is_empty());
        assert_eq!(image.pixel(0, 0), None);
        assert_eq!(image, PixelImage::default());
    }

    #[test]
    fn test_from_png_bytes() {
        let source = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let image = PixelImage::from_bytes(&encode(&source, ImageFormat::Png)).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.pixel(2, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_from_bmp_bytes() {
        let source = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        let image = PixelImage::from_bytes(&encode(&source, ImageFormat::Bmp)).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
    }

    #[test]
    fn test_from_garbage_fails() {
        assert!(PixelImage::from_bytes(b"definitely not an image").is_err());
        assert!(PixelImage::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(PixelImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelImage::from_rgba(2, 2, vec![0; 15]),
            Err(RenderError::InvalidDimensions { len: 15, .. })
        ));
    }

    #[test]
    fn test_equality_compares_pixels() {
        let a = PixelImage::from_color(2, 2, [1, 2, 3, 4]);
        let b = PixelImage::from_color(2, 2, [1, 2, 3, 4]);
        let c = PixelImage::from_color(2, 2, [9, 9, 9, 9]);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, PixelImage::null());
    }

    #[test]
    fn test_zero_sized_is_null() {
        assert!(PixelImage::from_rgba_image(RgbaImage::new(0, 5)).is_null());
    }
}
