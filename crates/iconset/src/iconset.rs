//! Iconsets: ordered, uniquely named collections of icons.
//!
//! An [`Iconset`] is a copy-on-write handle like [`Icon`]. Cloning shares
//! everything; the first mutation through a shared handle copies the icon
//! table (whose entries are themselves cheap shared [`Icon`] handles) and the
//! metadata.
//!
//! Clones also share an identity ([`IconsetId`]). Every mutation publishes
//! the mutated data to that identity, which is what an
//! [`IconsetRegistry`] reads; the registry itself only holds weak
//! references, so dropping the last handle of an identity deregisters it.
//!
//! # Loading
//!
//! ```ignore
//! use iconset::{Iconset, IconsetRegistry};
//!
//! let mut faces = Iconset::new();
//! if faces.load("/usr/share/app/iconsets/faces.jisp") {
//!     faces.add_to_registry(IconsetRegistry::global());
//! }
//! ```

use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use iconset_core::ConnectionId;
use iconset_core::logging::targets;
use iconset_render::PixelImage;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::IconsetResult;
use crate::icon::Icon;
use crate::loader::{LoadReport, load_bundle};
use crate::manifest::{Author, ManifestMeta};
use crate::prefs::{LoadOptions, SoundPrefs};
use crate::registry::IconsetRegistry;
use crate::shared::Shared;

/// Name given to bundles whose manifest does not name them.
pub const DEFAULT_ICONSET_NAME: &str = "Unnamed";

static NEXT_ICONSET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an iconset, shared by clones and used as its registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconsetId(u64);

impl IconsetId {
    fn next() -> Self {
        Self(NEXT_ICONSET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct IconsetData {
    name: String,
    version: String,
    description: String,
    authors: Vec<Author>,
    creation: String,
    home_url: String,
    file_name: Option<PathBuf>,
    info: IndexMap<String, String>,
    icons: IndexMap<String, Icon>,
}

impl Default for IconsetData {
    fn default() -> Self {
        Self {
            name: DEFAULT_ICONSET_NAME.to_string(),
            version: String::new(),
            description: String::new(),
            authors: Vec::new(),
            creation: String::new(),
            home_url: String::new(),
            file_name: None,
            info: IndexMap::new(),
            icons: IndexMap::new(),
        }
    }
}

impl IconsetData {
    /// Insert at the end, replacing any icon of the same name.
    fn append(&mut self, name: String, icon: Icon) {
        self.icons.shift_remove(&name);
        self.icons.insert(name, icon);
    }

    fn apply_meta(&mut self, meta: ManifestMeta) {
        if let Some(name) = meta.name {
            self.name = name;
        }
        if let Some(version) = meta.version {
            self.version = version;
        }
        if let Some(description) = meta.description {
            self.description = description;
        }
        if let Some(creation) = meta.creation {
            self.creation = creation;
        }
        if let Some(home) = meta.home {
            self.home_url = home;
        }
        self.authors.extend(meta.authors);
    }
}

/// State shared by every clone of one iconset.
#[derive(Debug)]
struct Identity {
    id: IconsetId,
    /// The data most recently published by a handle of this identity.
    current: RwLock<Weak<IconsetData>>,
}

/// A registry's reference to an iconset identity.
#[derive(Debug, Clone)]
pub(crate) struct WeakIconset {
    id: IconsetId,
    identity: Weak<Identity>,
}

impl WeakIconset {
    pub(crate) fn id(&self) -> IconsetId {
        self.id
    }

    /// Whether any handle of the identity is still alive.
    pub(crate) fn is_alive(&self) -> bool {
        self.identity.strong_count() > 0
    }

    /// A handle onto the identity's current data.
    ///
    /// `None` once the identity is gone, or while the handle that last
    /// published has been dropped and no other handle has mutated since.
    pub(crate) fn upgrade(&self) -> Option<Iconset> {
        let identity = self.identity.upgrade()?;
        let d = Shared::upgrade(&identity.current.read())?;
        Some(Iconset { identity, d })
    }
}

/// A named, ordered collection of icons with bundle metadata.
#[derive(Debug, Clone)]
pub struct Iconset {
    identity: Arc<Identity>,
    d: Shared<IconsetData>,
}

impl Iconset {
    /// Creates an empty iconset named [`DEFAULT_ICONSET_NAME`].
    pub fn new() -> Self {
        Self::with_data(Shared::new(IconsetData::default()))
    }

    fn with_data(d: Shared<IconsetData>) -> Self {
        let identity = Arc::new(Identity {
            id: IconsetId::next(),
            current: RwLock::new(d.downgrade()),
        });
        Self { identity, d }
    }

    /// An independent copy with its own identity.
    pub fn copy(&self) -> Self {
        Self::with_data(self.d.deep_copy())
    }

    /// Give this handle its own data if it is shared. Returns `true` if a
    /// copy was made.
    pub fn detach(&mut self) -> bool {
        let copied = self.d.detach();
        if copied {
            self.publish();
        }
        copied
    }

    /// This iconset's identity.
    pub fn id(&self) -> IconsetId {
        self.identity.id
    }

    /// Make this handle's data the state its identity shows to registries.
    pub(crate) fn publish(&self) {
        *self.identity.current.write() = self.d.downgrade();
    }

    pub(crate) fn downgrade(&self) -> WeakIconset {
        WeakIconset {
            id: self.id(),
            identity: Arc::downgrade(&self.identity),
        }
    }

    /// Mutate the data, then publish it.
    fn update<R>(&mut self, f: impl FnOnce(&mut IconsetData) -> R) -> R {
        let result = f(self.d.make_mut());
        self.publish();
        result
    }

    /// How many handles share this iconset's data.
    pub fn ref_count(&self) -> usize {
        self.d.ref_count()
    }

    /// Whether both handles share one payload.
    pub fn shares_data_with(&self, other: &Iconset) -> bool {
        self.d.ptr_eq(&other.d)
    }

    // ------------------------------------------------------------------
    // Icons
    // ------------------------------------------------------------------

    /// Number of icons.
    pub fn len(&self) -> usize {
        self.d.icons.len()
    }

    /// Whether there are no icons.
    pub fn is_empty(&self) -> bool {
        self.d.icons.is_empty()
    }

    /// The icon called `name`.
    pub fn icon(&self, name: &str) -> Option<&Icon> {
        self.d.icons.get(name)
    }

    /// Whether an icon called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.d.icons.contains_key(name)
    }

    /// Store `icon` under `name`, replacing any previous icon of that name.
    /// The icon moves to the end of the order.
    pub fn set_icon(&mut self, name: impl Into<String>, icon: Icon) {
        self.update(|d| d.append(name.into(), icon));
    }

    /// Remove the icon called `name`, returning it.
    pub fn remove_icon(&mut self, name: &str) -> Option<Icon> {
        if !self.contains(name) {
            return None;
        }
        self.update(|d| d.icons.shift_remove(name))
    }

    /// Remove every icon. Metadata is kept.
    pub fn clear(&mut self) {
        self.update(|d| d.icons.clear());
    }

    /// Add every icon of `other`, in its order. Icons of `other` replace
    /// icons of the same name here.
    pub fn append(&mut self, other: &Iconset) {
        let incoming: Vec<(String, Icon)> = other
            .iter()
            .map(|icon| (icon.name().to_string(), icon.clone()))
            .collect();
        self.update(|d| {
            for (name, icon) in incoming {
                d.append(name, icon);
            }
        });
    }

    /// Icons in order.
    pub fn iter(&self) -> impl Iterator<Item = &Icon> {
        self.d.icons.values()
    }

    /// Icon names in order.
    pub fn icon_names(&self) -> impl Iterator<Item = &str> {
        self.d.icons.keys().map(String::as_str)
    }

    /// Each icon's currently displayed image, by name.
    pub fn images(&self) -> IndexMap<String, PixelImage> {
        self.d
            .icons
            .iter()
            .map(|(name, icon)| (name.clone(), icon.current_image()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.d.name
    }

    pub fn version(&self) -> &str {
        &self.d.version
    }

    pub fn description(&self) -> &str {
        &self.d.description
    }

    pub fn authors(&self) -> &[Author] {
        &self.d.authors
    }

    pub fn creation(&self) -> &str {
        &self.d.creation
    }

    pub fn home_url(&self) -> &str {
        &self.d.home_url
    }

    /// Where the iconset was loaded from.
    pub fn file_name(&self) -> Option<&Path> {
        self.d.file_name.as_deref()
    }

    /// Record the bundle origin.
    pub fn set_file_name(&mut self, file_name: impl Into<PathBuf>) {
        let file_name = file_name.into();
        self.update(|d| d.file_name = Some(file_name));
    }

    /// Free-form `<x xmlns="...">` entries from the manifest.
    pub fn info(&self) -> &IndexMap<String, String> {
        &self.d.info
    }

    /// Replace the free-form entries.
    pub fn set_info(&mut self, info: IndexMap<String, String>) {
        self.update(|d| d.info = info);
    }

    /// Take all metadata (not the icons) from `other`.
    pub fn set_information(&mut self, other: &Iconset) {
        let from = &*other.d;
        let (name, version, description, authors, creation, home_url, file_name, info) = (
            from.name.clone(),
            from.version.clone(),
            from.description.clone(),
            from.authors.clone(),
            from.creation.clone(),
            from.home_url.clone(),
            from.file_name.clone(),
            from.info.clone(),
        );

        self.update(|d| {
            d.name = name;
            d.version = version;
            d.description = description;
            d.authors = authors;
            d.creation = creation;
            d.home_url = home_url;
            d.file_name = file_name;
            d.info = info;
        });
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load icons and metadata from a directory or a `.jisp`/`.zip` archive
    /// containing `icondef.xml`, unpacking sounds per the global
    /// [`SoundPrefs`].
    ///
    /// Returns `true` only if every icon loaded. Icons that did load are
    /// kept either way; a missing or malformed manifest changes nothing.
    pub fn load(&mut self, origin: impl AsRef<Path>) -> bool {
        self.load_with_options(origin, &LoadOptions::from_prefs())
    }

    /// [`load`](Self::load) with explicit options.
    pub fn load_with_options(&mut self, origin: impl AsRef<Path>, options: &LoadOptions) -> bool {
        self.try_load_with_options(origin, options)
            .is_ok_and(|report| report.is_complete())
    }

    /// Like [`load`](Self::load), returning the error or a per-icon report.
    pub fn try_load(&mut self, origin: impl AsRef<Path>) -> IconsetResult<LoadReport> {
        self.try_load_with_options(origin, &LoadOptions::from_prefs())
    }

    /// Like [`load_with_options`](Self::load_with_options), returning the
    /// error or a per-icon report.
    pub fn try_load_with_options(
        &mut self,
        origin: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> IconsetResult<LoadReport> {
        let origin = origin.as_ref();
        let bundle = load_bundle(origin, options)?;

        self.update(|d| {
            d.apply_meta(bundle.meta);
            for icon in bundle.icons {
                d.append(icon.name().to_string(), icon);
            }
            d.info.extend(bundle.info);
            d.file_name = Some(origin.to_path_buf());
        });

        tracing::debug!(
            target: targets::LOADER,
            iconset = %self.name(),
            icons = self.len(),
            complete = bundle.report.is_complete(),
            "iconset loaded"
        );
        Ok(bundle.report)
    }

    /// Configure where archive sounds are unpacked and who plays them.
    ///
    /// `handler` receives the sound file path each time an icon is
    /// activated with sound.
    pub fn set_sound_prefs<F>(unpack_dir: Option<PathBuf>, handler: F) -> ConnectionId
    where
        F: Fn(&PathBuf) + Send + Sync + 'static,
    {
        SoundPrefs::global().configure(unpack_dir, handler)
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register this iconset in `registry`, or make this handle's data the
    /// registered state if its identity is already registered.
    pub fn add_to_registry(&self, registry: &IconsetRegistry) {
        registry.register(self);
    }

    /// Remove this iconset from `registry`.
    pub fn remove_from_registry(&self, registry: &IconsetRegistry) {
        registry.unregister(self);
    }
}

impl Default for Iconset {
    fn default() -> Self {
        Self::new()
    }
}

impl AddAssign<&Iconset> for Iconset {
    fn add_assign(&mut self, other: &Iconset) {
        self.append(other);
    }
}

impl<'a> IntoIterator for &'a Iconset {
    type Item = &'a Icon;
    type IntoIter = indexmap::map::Values<'a, String, Icon>;

    fn into_iter(self) -> Self::IntoIter {
        self.d.icons.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Icon {
        let mut icon = Icon::new();
        icon.set_name(name);
        icon.set_image(PixelImage::from_color(1, 1, [1, 2, 3, 255]));
        icon
    }

    #[test]
    fn test_new_iconset_defaults() {
        let set = Iconset::new();
        assert_eq!(set.name(), DEFAULT_ICONSET_NAME);
        assert!(set.is_empty());
        assert!(set.file_name().is_none());
        assert_ne!(set.id(), Iconset::new().id());
    }

    #[test]
    fn test_set_icon_replaces_and_moves_to_end() {
        let mut set = Iconset::new();
        set.set_icon("a", named("a"));
        set.set_icon("b", named("b"));
        set.set_icon("a", named("a2"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.icon_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.icon("a").unwrap().name(), "a2");
        assert_eq!(set.iter().count(), set.icon_names().count());
    }

    #[test]
    fn test_clone_shares_until_mutation() {
        let mut a = Iconset::new();
        a.set_icon("x", named("x"));
        let mut b = a.clone();
        assert_eq!(a.id(), b.id());
        assert!(a.shares_data_with(&b));

        b.remove_icon("x");
        assert!(a.contains("x"));
        assert!(!b.contains("x"));
        assert_eq!(a.ref_count(), 1);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_copy_survives_clear() {
        let mut original = Iconset::new();
        original.set_icon("x", named("x"));
        let copy = original.copy();
        assert_ne!(copy.id(), original.id());

        original.clear();
        assert!(original.is_empty());
        assert_eq!(copy.len(), 1);
    }

    #[test]
    fn test_append_later_wins() {
        let mut a = Iconset::new();
        a.set_icon("x", named("x"));
        a.set_icon("y", named("y"));
        let mut b = Iconset::new();
        b.set_icon("x", named("x"));
        b.set_icon("z", named("z"));

        a += &b;
        assert_eq!(a.icon_names().collect::<Vec<_>>(), vec!["y", "x", "z"]);
        assert!(a.icon("x").unwrap().shares_data_with(b.icon("x").unwrap()));
    }

    #[test]
    fn test_remove_missing_does_not_detach() {
        let a = Iconset::new();
        let mut b = a.clone();
        assert!(b.remove_icon("nope").is_none());
        assert!(a.shares_data_with(&b));
    }

    #[test]
    fn test_set_information_copies_metadata_only() {
        let mut source = Iconset::new();
        source.set_icon("x", named("x"));
        source.set_file_name("/bundles/faces");
        let mut info = IndexMap::new();
        info.insert("ns".to_string(), "value".to_string());
        source.set_info(info);

        let mut target = Iconset::new();
        target.set_information(&source);
        assert!(target.is_empty());
        assert_eq!(target.file_name(), Some(Path::new("/bundles/faces")));
        assert_eq!(target.info().get("ns").map(String::as_str), Some("value"));
    }

    #[test]
    fn test_images_by_name() {
        let mut set = Iconset::new();
        set.set_icon("x", named("x"));
        let images = set.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images["x"].dimensions(), (1, 1));
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = Iconset::new();
        set.set_icon("keep", named("keep"));

        assert!(!set.load(dir.path()));
        let err = set.try_load(dir.path()).unwrap_err();
        assert_eq!(err.kind(), crate::IconsetErrorKind::ManifestMissing);
        assert_eq!(set.len(), 1);
        assert!(set.file_name().is_none());
    }
}
