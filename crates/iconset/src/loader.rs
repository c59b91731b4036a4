//! Resolving a manifest against a byte source.
//!
//! For each `<icon>` entry the loader tries the image candidates in MIME
//! priority order until one decodes, picks the first usable sound, and
//! builds the search pattern from the entry's text. An icon whose images
//! all fail is dropped and reported; the rest of the bundle still loads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use iconset_core::logging::targets;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::error::{IconsetError, IconsetErrorKind, IconsetResult};
use crate::icon::{Icon, search_pattern};
use crate::manifest::{IconEntry, MANIFEST_FILE, Manifest, ManifestMeta};
use crate::prefs::LoadOptions;
use crate::source::{ByteSource, SourceKind, open_source};

static ICON_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh `icon_NNNN` name, unique within the process.
pub fn next_icon_name() -> String {
    format!("icon_{:04}", ICON_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Outcome of a load that got past the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    loaded: Vec<String>,
    failed: Vec<String>,
    sounds_skipped: usize,
}

impl LoadReport {
    /// Whether every icon in the manifest loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Names of the icons that loaded, in manifest order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Names of the icons that were dropped.
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// How many archive sounds were not unpacked for lack of an unpack
    /// directory.
    pub fn sounds_skipped(&self) -> usize {
        self.sounds_skipped
    }
}

/// Everything read from one bundle origin.
#[derive(Debug)]
pub(crate) struct LoadedBundle {
    pub meta: ManifestMeta,
    pub icons: Vec<Icon>,
    pub info: IndexMap<String, String>,
    pub report: LoadReport,
}

/// Read and resolve the bundle at `origin`.
#[tracing::instrument(name = "iconset::load", target = "iconset::loader", level = "debug", skip_all, fields(origin = %origin.display()))]
pub(crate) fn load_bundle(origin: &Path, options: &LoadOptions) -> IconsetResult<LoadedBundle> {
    let mut source = open_source(origin)?;

    let data = source
        .read_file(MANIFEST_FILE)
        .map_err(|e| e.with_kind(IconsetErrorKind::ManifestMissing))?;
    let manifest = Manifest::parse(&data).map_err(|e| {
        tracing::warn!(target: targets::LOADER, origin = %origin.display(), error = %e, "invalid manifest");
        e
    })?;

    let mut loader = Loader {
        source: source.as_mut(),
        options,
        report: LoadReport::default(),
    };

    let mut icons = Vec::with_capacity(manifest.icons.len());
    for entry in &manifest.icons {
        let name = entry.name.clone().unwrap_or_else(next_icon_name);
        match loader.build_icon(entry, name.clone()) {
            Ok(icon) => {
                loader.report.loaded.push(name);
                icons.push(icon);
            }
            Err(e) => {
                tracing::warn!(target: targets::LOADER, icon = %name, error = %e, "icon dropped");
                loader.report.failed.push(name);
            }
        }
    }

    let report = loader.report;
    tracing::debug!(
        target: targets::LOADER,
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        "bundle read"
    );

    Ok(LoadedBundle {
        meta: manifest.meta,
        icons,
        info: manifest.info,
        report,
    })
}

struct Loader<'a> {
    source: &'a mut dyn ByteSource,
    options: &'a LoadOptions,
    report: LoadReport,
}

impl Loader<'_> {
    fn build_icon(&mut self, entry: &IconEntry, name: String) -> IconsetResult<Icon> {
        let mut icon = Icon::new();
        icon.set_name(name);
        icon.set_text(entry.text.clone());
        if !entry.text.is_empty() {
            icon.set_pattern(search_pattern(entry.text.distinct_texts()));
        }

        let mut decoded = false;
        for (mime, path) in entry.image_candidates() {
            let data = match self.source.read_file(path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::debug!(target: targets::LOADER, icon = %icon.name(), mime, error = %e, "image unreadable");
                    continue;
                }
            };
            if icon.load_from_bytes(&data, entry.wants_animation(mime)) {
                decoded = true;
                break;
            }
            tracing::debug!(target: targets::LOADER, icon = %icon.name(), mime, path, "image did not decode");
        }

        if !decoded {
            return Err(IconsetError::with_message(
                IconsetErrorKind::IconDecodeFailed,
                self.source.origin(),
                format!("no usable image for icon '{}'", icon.name()),
            ));
        }

        if let Some(sound) = self.resolve_sound(entry) {
            icon.set_sound(Some(sound));
        }
        Ok(icon)
    }

    fn resolve_sound(&mut self, entry: &IconEntry) -> Option<PathBuf> {
        let origin = absolute(self.source.origin());
        let options = self.options;

        for (mime, path) in entry.sound_candidates() {
            match self.source.kind() {
                SourceKind::Directory => return Some(origin.join(path.trim_start_matches('/'))),
                SourceKind::Archive => {
                    let Some(unpack_dir) = options.sound_unpack_dir() else {
                        let skipped = IconsetError::with_message(
                            IconsetErrorKind::SoundUnpackSkipped,
                            origin.join(path),
                            "no unpack directory configured",
                        );
                        tracing::debug!(target: targets::LOADER, error = %skipped, "sound omitted");
                        self.report.sounds_skipped += 1;
                        return None;
                    };
                    match self.unpack_sound(&origin, unpack_dir, path) {
                        Ok(target) => return Some(target),
                        Err(e) => {
                            tracing::debug!(target: targets::LOADER, mime, error = %e, "sound not unpacked");
                        }
                    }
                }
            }
        }
        None
    }

    fn unpack_sound(&mut self, archive: &Path, unpack_dir: &Path, path: &str) -> IconsetResult<PathBuf> {
        let target = unpack_dir.join(unpacked_sound_name(archive, path));
        let data = self.source.read_file(path)?;
        fs::create_dir_all(unpack_dir).map_err(|e| IconsetError::from_io(e, unpack_dir))?;
        fs::write(&target, data).map_err(|e| IconsetError::from_io(e, &target))?;
        Ok(target)
    }
}

/// File name an archive sound is unpacked under: the SHA-256 of
/// `"<archive>/<path>"` in hex, plus the sound's extension.
pub fn unpacked_sound_name(archive: &Path, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}/{}", archive.display(), path).as_bytes());
    let digest = hex::encode(hasher.finalize());

    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{digest}.{ext}"),
        None => digest,
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
