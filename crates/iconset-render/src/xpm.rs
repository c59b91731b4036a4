//! XPM (X PixMap) decoding.
//!
//! Only the XPM3 flavour is understood: a C source fragment whose string
//! literals hold the header, the colour table and the pixel rows.
//!
//! ```text
//! /* XPM */
//! static char *smile[] = {
//! "2 1 2 1",
//! "a c #FF0000",
//! ". c None",
//! "a.",
//! };
//! ```

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::error::{RenderError, RenderResult};
use crate::pixel_image::PixelImage;

const XPM_MAGIC: &str = "/* XPM */";

/// Whether `data` starts with the XPM3 magic comment.
pub(crate) fn looks_like_xpm(data: &[u8]) -> bool {
    let head = &data[..data.len().min(64)];
    String::from_utf8_lossy(head)
        .trim_start()
        .starts_with(XPM_MAGIC)
}

/// Largest pixel count a document may declare.
pub const MAX_PIXELS: u64 = 4096 * 4096;

/// Decode an XPM3 document.
pub fn decode(data: &[u8]) -> RenderResult<PixelImage> {
    let text = std::str::from_utf8(data).map_err(|e| RenderError::Xpm(e.to_string()))?;
    let strings = string_literals(text);
    let mut lines = strings.iter();

    let header = lines
        .next()
        .ok_or_else(|| RenderError::Xpm("missing header".into()))?;
    let values: Vec<usize> = header
        .split_whitespace()
        .take(4)
        .map(|v| v.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| RenderError::Xpm(format!("bad header {:?}: {}", header, e)))?;
    let &[width, height, ncolors, cpp] = values.as_slice() else {
        return Err(RenderError::Xpm(format!("bad header {:?}", header)));
    };
    if cpp == 0 {
        return Err(RenderError::Xpm("zero characters per pixel".into()));
    }
    let available = strings.len() - 1;
    if ncolors > available || height > available - ncolors {
        return Err(RenderError::Xpm(format!(
            "header {:?} declares more lines than the document has",
            header
        )));
    }
    let too_large = || RenderError::Xpm(format!("image too large: {}x{}", width, height));
    let (w, h) = (
        u32::try_from(width).map_err(|_| too_large())?,
        u32::try_from(height).map_err(|_| too_large())?,
    );
    match (w as u64).checked_mul(h as u64) {
        Some(pixels) if pixels <= MAX_PIXELS => {}
        _ => return Err(too_large()),
    }
    if width.checked_mul(cpp).is_none() {
        return Err(too_large());
    }

    let mut palette = HashMap::new();
    for _ in 0..ncolors {
        let line = lines
            .next()
            .ok_or_else(|| RenderError::Xpm("truncated colour table".into()))?;
        let key = line
            .get(..cpp)
            .ok_or_else(|| RenderError::Xpm(format!("short colour entry {:?}", line)))?;
        palette.insert(key.to_string(), colour_entry(&line[cpp..])?);
    }

    let mut image = RgbaImage::new(w, h);
    for y in 0..height {
        let row = lines
            .next()
            .ok_or_else(|| RenderError::Xpm(format!("missing pixel row {}", y)))?;
        for x in 0..width {
            let key = row
                .get(x * cpp..(x + 1) * cpp)
                .ok_or_else(|| RenderError::Xpm(format!("short pixel row {}", y)))?;
            let colour = palette
                .get(key)
                .ok_or_else(|| RenderError::Xpm(format!("undefined colour key {:?}", key)))?;
            image.put_pixel(x as u32, y as u32, Rgba(*colour));
        }
    }

    Ok(PixelImage::from_rgba_image(image))
}

/// Collect the contents of every C string literal, skipping comments.
fn string_literals(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' => {
                let mut literal = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                literal.push(escaped);
                            }
                        }
                        _ => literal.push(c),
                    }
                }
                out.push(literal);
            }
            _ => {}
        }
    }

    out
}

/// Parse the part of a colour-table line after the pixel key.
///
/// Entries are `context value` pairs; the colour (`c`) context wins over the
/// grayscale and monochrome ones.
fn colour_entry(spec: &str) -> RenderResult<[u8; 4]> {
    let mut contexts: Vec<(&str, String)> = Vec::new();
    for token in spec.split_whitespace() {
        match token {
            "c" | "m" | "g" | "g4" | "s" => contexts.push((token, String::new())),
            _ => match contexts.last_mut() {
                Some((_, value)) => {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(token);
                }
                None => return Err(RenderError::Xpm(format!("bad colour entry {:?}", spec))),
            },
        }
    }

    ["c", "g", "g4", "m"]
        .iter()
        .find_map(|wanted| contexts.iter().find(|(ctx, _)| ctx == wanted))
        .ok_or_else(|| RenderError::Xpm(format!("no colour in entry {:?}", spec)))
        .and_then(|(_, value)| parse_colour(value))
}

fn parse_colour(value: &str) -> RenderResult<[u8; 4]> {
    if value.eq_ignore_ascii_case("none") {
        return Ok([0, 0, 0, 0]);
    }

    if let Some(hex) = value.strip_prefix('#') {
        let digits = hex.len() / 3;
        if digits == 0 || hex.len() % 3 != 0 || digits > 4 {
            return Err(RenderError::Xpm(format!("bad colour {:?}", value)));
        }
        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            let part = &hex[i * digits..(i + 1) * digits];
            let raw = u16::from_str_radix(part, 16)
                .map_err(|_| RenderError::Xpm(format!("bad colour {:?}", value)))?;
            // Scale to 8 bits regardless of the digit count
            let max = (1u32 << (digits * 4)) - 1;
            *channel = ((raw as u32 * 255 + max / 2) / max) as u8;
        }
        return Ok([rgb[0], rgb[1], rgb[2], 255]);
    }

    let rgb = match value.to_ascii_lowercase().replace(' ', "").as_str() {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "gray" | "grey" => [190, 190, 190],
        "lightgray" | "lightgrey" => [211, 211, 211],
        "darkgray" | "darkgrey" => [169, 169, 169],
        other => {
            tracing::debug!(target: "iconset_render", colour = other, "unknown XPM colour name, using black");
            [0, 0, 0]
        }
    };
    Ok([rgb[0], rgb[1], rgb[2], 255])
}
