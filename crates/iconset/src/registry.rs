//! Name lookup across registered iconsets.
//!
//! An [`IconsetRegistry`] keeps iconsets in registration order and answers
//! "which icon is called `name`?" with the first match. It holds weak
//! references to iconset identities and reads their current data on every
//! query: mutations made after registering are visible, and an iconset whose
//! handles have all been dropped disappears from the registry.

use std::sync::OnceLock;

use iconset_core::logging::targets;
use iconset_render::PixelImage;
use parking_lot::{Mutex, RwLock};

use crate::icon::Icon;
use crate::iconset::{Iconset, IconsetId, WeakIconset};

static GLOBAL_REGISTRY: OnceLock<IconsetRegistry> = OnceLock::new();

/// Ordered set of registered iconsets.
pub struct IconsetRegistry {
    entries: RwLock<Vec<WeakIconset>>,
    /// Returned by [`image`](Self::image) on a miss.
    empty_image: Mutex<Option<PixelImage>>,
}

impl IconsetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            empty_image: Mutex::new(None),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static IconsetRegistry {
        GLOBAL_REGISTRY.get_or_init(IconsetRegistry::new)
    }

    /// Register `iconset`. Registering an identity that is already
    /// registered keeps its position and makes `iconset`'s data the state
    /// the registry sees.
    pub fn register(&self, iconset: &Iconset) {
        iconset.publish();
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.id() == iconset.id()) {
            return;
        }
        tracing::debug!(target: targets::REGISTRY, iconset = %iconset.name(), "registered");
        entries.push(iconset.downgrade());
    }

    /// Remove `iconset` if registered. Returns whether it was.
    pub fn unregister(&self, iconset: &Iconset) -> bool {
        self.unregister_id(iconset.id())
    }

    /// Remove the iconset with identity `id`.
    pub fn unregister_id(&self, id: IconsetId) -> bool {
        let mut entries = self.entries.write();
        let Some(index) = entries.iter().position(|e| e.id() == id) else {
            return false;
        };
        entries.remove(index);
        tracing::debug!(target: targets::REGISTRY, id = id.as_u64(), "unregistered");
        self.release_placeholder_if_empty(&entries);
        true
    }

    /// Whether `iconset` is registered.
    pub fn contains(&self, iconset: &Iconset) -> bool {
        self.entries
            .read()
            .iter()
            .any(|e| e.id() == iconset.id() && e.is_alive())
    }

    /// The first registered icon called `name`.
    pub fn lookup(&self, name: &str) -> Option<Icon> {
        let iconsets = self.iconsets();
        let found = iconsets.iter().find_map(|is| is.icon(name)).cloned();
        if found.is_none() {
            tracing::debug!(target: targets::REGISTRY, name, iconsets = iconsets.len(), "icon not found");
        }
        found
    }

    /// The still image of the first icon called `name`, or an empty image.
    pub fn image(&self, name: &str) -> PixelImage {
        match self.lookup(name) {
            Some(icon) => icon.image().clone(),
            None => self
                .empty_image
                .lock()
                .get_or_insert_with(PixelImage::null)
                .clone(),
        }
    }

    /// Icon names of every registered iconset, in registration order.
    /// Names present in several iconsets appear once per iconset.
    pub fn names(&self) -> Vec<String> {
        self.iconsets()
            .iter()
            .flat_map(|is| is.icon_names().map(String::from).collect::<Vec<_>>())
            .collect()
    }

    /// Handles onto the registered iconsets' current data, in order.
    ///
    /// Entries whose iconset has been dropped are removed on the way.
    pub fn iconsets(&self) -> Vec<Iconset> {
        let mut dead = false;
        let live: Vec<Iconset> = self
            .entries
            .read()
            .iter()
            .filter_map(|e| {
                dead |= !e.is_alive();
                e.upgrade()
            })
            .collect();
        if dead {
            self.prune();
        }
        live
    }

    /// Number of registered iconsets that are still alive.
    pub fn len(&self) -> usize {
        self.prune();
        self.entries.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget entries whose iconset has been dropped.
    fn prune(&self) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| {
            let alive = e.is_alive();
            if !alive {
                tracing::debug!(target: targets::REGISTRY, id = e.id().as_u64(), "dropped iconset unregistered");
            }
            alive
        });
        if entries.len() != before {
            self.release_placeholder_if_empty(&entries);
        }
    }

    fn release_placeholder_if_empty(&self, entries: &[WeakIconset]) {
        if entries.is_empty() {
            self.empty_image.lock().take();
        }
    }

    fn has_cached_empty_image(&self) -> bool {
        self.empty_image.lock().is_some()
    }
}

impl Default for IconsetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IconsetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconsetRegistry")
            .field("iconsets", &self.len())
            .field("empty_image_cached", &self.has_cached_empty_image())
            .finish()
    }
}
