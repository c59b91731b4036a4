//! SVG rasterisation.
//!
//! Vector icons are rasterised once, at their natural size, when they are
//! loaded. The result is an ordinary [`PixelImage`].

use std::sync::Arc;

use resvg::tiny_skia;
use resvg::usvg;

use crate::error::{RenderError, RenderResult};
use crate::pixel_image::PixelImage;

/// A parsed SVG document.
///
/// The underlying tree is wrapped in an `Arc` so clones are cheap.
#[derive(Clone)]
pub struct SvgImage {
    tree: Arc<usvg::Tree>,
    width: f32,
    height: f32,
}

impl SvgImage {
    /// Parse an SVG document from bytes in memory.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Svg`] if the document is invalid or malformed.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(data, &options)
            .map_err(|e| RenderError::Svg(format!("failed to parse SVG: {}", e)))?;

        let size = tree.size();
        Ok(Self {
            width: size.width(),
            height: size.height(),
            tree: Arc::new(tree),
        })
    }

    /// The natural size of the document, from its `width`/`height` or `viewBox`.
    pub fn natural_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Render the document to straight-alpha RGBA at the given pixel size.
    pub fn render_to_rgba(&self, width: u32, height: u32) -> RenderResult<Vec<u8>> {
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(
            RenderError::InvalidDimensions {
                width,
                height,
                len: 0,
            },
        )?;

        let sx = width as f32 / self.width;
        let sy = height as f32 / self.height;
        resvg::render(
            &self.tree,
            tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        // tiny-skia stores premultiplied RGBA
        let mut result = Vec::with_capacity(pixmap.data().len());
        for chunk in pixmap.data().chunks(4) {
            let a = chunk[3] as f32 / 255.0;
            if a > 0.0 {
                result.push((chunk[0] as f32 / a).min(255.0) as u8);
                result.push((chunk[1] as f32 / a).min(255.0) as u8);
                result.push((chunk[2] as f32 / a).min(255.0) as u8);
                result.push(chunk[3]);
            } else {
                result.extend_from_slice(&[0, 0, 0, 0]);
            }
        }

        Ok(result)
    }

    /// Rasterise at the natural size, rounded up to whole pixels.
    pub fn to_pixel_image(&self) -> RenderResult<PixelImage> {
        let width = self.width.ceil().max(1.0) as u32;
        let height = self.height.ceil().max(1.0) as u32;
        let rgba = self.render_to_rgba(width, height)?;
        PixelImage::from_rgba(width, height, rgba)
    }
}

impl std::fmt::Debug for SvgImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgImage")
            .field("natural_size", &format!("{}x{}", self.width, self.height))
            .finish()
    }
}

/// Quick check whether `data` looks like an SVG document.
pub(crate) fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with('<') && text.contains("<svg")
}
