//! Fixture bundles for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
use tracing_subscriber::EnvFilter;
use zip::write::SimpleFileOptions;

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn png(colour: [u8; 4]) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::from_pixel(4, 4, Rgba(colour))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub fn gif(colours: &[[u8; 4]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let frames = colours.iter().map(|c| {
            Frame::from_parts(
                RgbaImage::from_pixel(4, 4, Rgba(*c)),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

pub const XPM: &[u8] = br#"/* XPM */
static char *dot[] = {
"2 2 2 1",
"  c None",
"x c #0000FF",
"x ",
" x"
};
"#;

pub const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<icondef>
  <meta>
    <name>Faces</name>
    <version>1.0</version>
    <description>Test faces</description>
    <author email="alice@example.org">Alice</author>
    <creation>2024-01-01</creation>
    <home>https://example.org</home>
  </meta>
  <icon>
    <text xml:lang="en">:-)</text>
    <text xml:lang="de">:-)</text>
    <text>:)</text>
    <object mime="image/gif">smile.gif</object>
    <object mime="image/png">smile.png</object>
    <object mime="audio/x-wav">smile.wav</object>
    <x xmlns="name">smile</x>
  </icon>
  <icon>
    <text>;)</text>
    <object mime="image/gif">wink.gif</object>
    <x xmlns="name">wink</x>
  </icon>
  <icon>
    <object mime="image/gif">still.gif</object>
    <x xmlns="name">still</x>
  </icon>
  <icon>
    <graphic mime="image/x-xpm">dot.xpm</graphic>
    <x xmlns="name">dot</x>
  </icon>
  <x xmlns="http://example.org/extra">payload</x>
</icondef>
"#;

pub fn bundle_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("icondef.xml", MANIFEST.as_bytes().to_vec()),
        ("smile.png", png(RED)),
        ("smile.gif", gif(&[GREEN, BLUE])),
        ("smile.wav", b"RIFF....WAVE".to_vec()),
        ("wink.gif", gif(&[RED, GREEN, BLUE])),
        ("still.gif", gif(&[BLUE])),
        ("dot.xpm", XPM.to_vec()),
    ]
}

pub fn write_dir(root: &Path, files: &[(&str, Vec<u8>)]) {
    for (name, data) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }
}

/// Write a zip with every file placed under `prefix` (empty for the root).
pub fn write_zip(path: &Path, prefix: &str, files: &[(&str, Vec<u8>)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in files {
        let entry = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        zip.start_file(entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}
