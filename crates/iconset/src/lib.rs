//! Icon sets loaded from `icondef.xml` bundles.
//!
//! An iconset is a directory or a `.jisp`/`.zip` archive with an
//! `icondef.xml` manifest listing icons: each with one or more image
//! encodings, optional sounds and localized text. This crate loads such
//! bundles into [`Iconset`]s of copy-on-write [`Icon`] handles and resolves
//! icon names across several bundles with an [`IconsetRegistry`].
//!
//! ```ignore
//! use iconset::{Iconset, IconsetRegistry};
//!
//! let mut faces = Iconset::new();
//! faces.load("iconsets/faces.jisp");
//! faces.add_to_registry(IconsetRegistry::global());
//!
//! if let Some(smile) = IconsetRegistry::global().lookup("smile") {
//!     smile.activate(true);
//! }
//! ```
//!
//! Logging goes through `tracing`; see [`iconset_core::logging`] for the
//! targets.

mod error;
mod icon;
mod iconset;
mod loader;
mod manifest;
mod prefs;
mod registry;
mod shared;
mod source;
mod xml;

pub use error::{IconsetError, IconsetErrorKind, IconsetResult};
pub use icon::{Icon, IconSignals, IconText, search_pattern};
pub use iconset::{DEFAULT_ICONSET_NAME, Iconset, IconsetId};
pub use loader::{LoadReport, next_icon_name, unpacked_sound_name};
pub use manifest::{
    ANIMATION_MIME, Author, IMAGE_MIME_PRIORITY, IconEntry, MANIFEST_FILE, Manifest, ManifestMeta,
    SOUND_MIME_PRIORITY, TypeHint,
};
pub use prefs::{LoadOptions, SoundPrefs, default_unpack_dir};
pub use registry::IconsetRegistry;
pub use shared::Shared;
pub use source::{
    ARCHIVE_EXTENSIONS, ArchiveSource, ByteSource, DirectorySource, SourceKind, is_archive_path,
    open_source,
};

pub use iconset_core::{ConnectionId, Signal};
pub use iconset_render::{AnimatedImage, AnimationController, AnimationFrame, PixelImage};
