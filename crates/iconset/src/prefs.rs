//! Sound preferences and per-load options.
//!
//! Sounds referenced from archive bundles must be unpacked to disk before
//! anything can play them. Where they go, and who hears the "play sound"
//! event, is configured once through [`SoundPrefs::global`] (usually via
//! [`Iconset::set_sound_prefs`](crate::Iconset::set_sound_prefs)). A single
//! load can override the unpack directory with [`LoadOptions`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use directories::ProjectDirs;
use iconset_core::{ConnectionId, Signal};
use parking_lot::RwLock;

static GLOBAL_PREFS: OnceLock<SoundPrefs> = OnceLock::new();

/// Where archive sounds are unpacked, and the "play sound" broadcast.
pub struct SoundPrefs {
    unpack_dir: RwLock<Option<PathBuf>>,
    play_sound: Signal<PathBuf>,
}

impl SoundPrefs {
    /// Creates preferences with no unpack directory and no listeners.
    pub fn new() -> Self {
        Self {
            unpack_dir: RwLock::new(None),
            play_sound: Signal::new(),
        }
    }

    /// The process-wide preferences, created on first use.
    pub fn global() -> &'static SoundPrefs {
        GLOBAL_PREFS.get_or_init(SoundPrefs::new)
    }

    /// The directory archive sounds are unpacked into, if configured.
    pub fn unpack_dir(&self) -> Option<PathBuf> {
        self.unpack_dir.read().clone()
    }

    /// Set (or clear) the unpack directory.
    pub fn set_unpack_dir(&self, dir: Option<PathBuf>) {
        *self.unpack_dir.write() = dir;
    }

    /// Emitted with the sound's file path when an icon is activated with
    /// sound enabled.
    pub fn play_sound(&self) -> &Signal<PathBuf> {
        &self.play_sound
    }

    /// Set the unpack directory and connect a "play sound" handler.
    pub fn configure<F>(&self, unpack_dir: Option<PathBuf>, handler: F) -> ConnectionId
    where
        F: Fn(&PathBuf) + Send + Sync + 'static,
    {
        self.set_unpack_dir(unpack_dir);
        self.play_sound.connect(handler)
    }
}

impl Default for SoundPrefs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SoundPrefs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundPrefs")
            .field("unpack_dir", &*self.unpack_dir.read())
            .field("listeners", &self.play_sound.connection_count())
            .finish()
    }
}

/// The per-user cache directory for unpacked sounds of application `app_name`.
///
/// Returns `None` when no home directory can be determined.
pub fn default_unpack_dir(app_name: &str) -> Option<PathBuf> {
    ProjectDirs::from("", "", app_name).map(|dirs| dirs.cache_dir().join("sounds"))
}

/// Options for a single [`Iconset::load_with_options`](crate::Iconset::load_with_options) call.
///
/// # Example
///
/// ```
/// use iconset::LoadOptions;
///
/// let options = LoadOptions::new().unpack_dir("/tmp/iconset-sounds");
/// assert!(options.sound_unpack_dir().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    unpack_dir: Option<PathBuf>,
}

impl LoadOptions {
    /// Options that unpack no sounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options taken from the global [`SoundPrefs`].
    pub fn from_prefs() -> Self {
        Self {
            unpack_dir: SoundPrefs::global().unpack_dir(),
        }
    }

    /// Unpack archive sounds into `dir`.
    pub fn unpack_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.unpack_dir = Some(dir.into());
        self
    }

    /// The configured unpack directory.
    pub fn sound_unpack_dir(&self) -> Option<&Path> {
        self.unpack_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_prefs_configure() {
        let prefs = SoundPrefs::new();
        assert!(prefs.unpack_dir().is_none());

        let heard = Arc::new(AtomicUsize::new(0));
        let heard_clone = heard.clone();
        prefs.configure(Some(PathBuf::from("/tmp/s")), move |_| {
            heard_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(prefs.unpack_dir(), Some(PathBuf::from("/tmp/s")));
        prefs.play_sound().emit(PathBuf::from("/tmp/s/a.wav"));
        assert_eq!(heard.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_options_builder() {
        assert!(LoadOptions::new().sound_unpack_dir().is_none());
        let options = LoadOptions::new().unpack_dir("/var/cache/x");
        assert_eq!(options.sound_unpack_dir(), Some(Path::new("/var/cache/x")));
    }

    #[test]
    fn test_default_unpack_dir_is_below_cache() {
        if let Some(dir) = default_unpack_dir("iconset-test") {
            assert!(dir.ends_with("sounds"));
        }
    }
}
