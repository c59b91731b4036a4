//! Icons: one named still image, animation and sound.
//!
//! An [`Icon`] is a copy-on-write handle. Cloning it is cheap and shares all
//! data; any setter first detaches the handle so siblings are unaffected.
//!
//! Playback state (how many views currently show the icon, and where its
//! animation is) belongs to the shared payload and is driven through `&self`:
//! [`Icon::activate`], [`Icon::deactivate`] and [`Icon::advance`].
//!
//! # Example
//!
//! ```ignore
//! use iconset::Icon;
//!
//! let mut icon = Icon::new();
//! icon.set_name("smile");
//! icon.load_from_bytes(&gif_bytes, true);
//!
//! icon.on_image_changed(|image| println!("now {}x{}", image.width(), image.height()));
//! icon.activate(false);
//! icon.advance(std::time::Duration::from_millis(100));
//! icon.deactivate();
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use iconset_core::logging::targets;
use iconset_core::{ConnectionId, Signal};
use iconset_render::{AnimatedImage, AnimationController, PixelImage};
use parking_lot::Mutex;
use regex::Regex;

use crate::prefs::SoundPrefs;
use crate::shared::Shared;

/// Localized text variants of an icon.
///
/// A multimap from language tag to text: one language may carry several
/// variants, and the empty tag stands for "no language given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconText {
    entries: Vec<(String, String)>,
}

impl IconText {
    /// An empty text map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant for `lang`. Existing variants are kept.
    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.entries.push((lang.into(), text.into()));
    }

    /// All variants for `lang`, in insertion order.
    pub fn get_all<'s>(&'s self, lang: &str) -> impl Iterator<Item = &'s str> + use<'s> {
        let lang = lang.to_owned();
        self.entries
            .iter()
            .filter(move |(l, _)| *l == lang)
            .map(|(_, t)| t.as_str())
    }

    /// The first variant for `lang`.
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == lang)
            .map(|(_, t)| t.as_str())
    }

    /// `(lang, text)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    /// Distinct texts across all languages, first occurrence first.
    pub fn distinct_texts(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for (_, text) in &self.entries {
            if !seen.contains(&text.as_str()) {
                seen.push(text);
            }
        }
        seen
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no variants.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a pattern matching any of `texts` literally.
///
/// Returns `None` for an empty input.
pub fn search_pattern<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<Regex> {
    let alternatives: Vec<String> = texts.into_iter().map(regex::escape).collect();
    if alternatives.is_empty() {
        return None;
    }
    // Escaped literals always form a valid pattern
    Regex::new(&alternatives.join("|")).ok()
}

/// Notifications one icon handle delivers to its observers.
#[derive(Debug, Default)]
pub struct IconSignals {
    image_changed: Signal<PixelImage>,
    modified: Signal<PixelImage>,
}

impl IconSignals {
    /// Fires with the currently displayed image whenever it changes: on any
    /// still image or animation replacement, and on each animation frame.
    pub fn image_changed(&self) -> &Signal<PixelImage> {
        &self.image_changed
    }

    /// Fires with the still image when the icon is loaded or its image or
    /// animation is replaced.
    pub fn modified(&self) -> &Signal<PixelImage> {
        &self.modified
    }
}

#[derive(Clone, Default)]
struct IconData {
    name: String,
    pattern: Option<Regex>,
    text: IconText,
    sound: Option<PathBuf>,
    image: PixelImage,
    animation: Option<AnimatedImage>,
}

#[derive(Default)]
struct Playback {
    active_count: usize,
    controller: Option<AnimationController>,
    /// Whether `advance` currently drives the animation.
    subscribed: bool,
}

#[derive(Default)]
struct IconPrivate {
    data: IconData,
    playback: Mutex<Playback>,
    /// Every live handle sharing this payload.
    observers: Mutex<Vec<Weak<IconSignals>>>,
}

impl Clone for IconPrivate {
    // A copy starts inactive, with no observers
    fn clone(&self) -> Self {
        let controller = self.data.animation.as_ref().map(AnimationController::new_paused);
        Self {
            data: self.data.clone(),
            playback: Mutex::new(Playback {
                controller,
                ..Playback::default()
            }),
            observers: Mutex::new(Vec::new()),
        }
    }
}

/// One named icon: a still image, an optional animation, an optional sound,
/// localized text and a search pattern built from it.
pub struct Icon {
    d: Shared<IconPrivate>,
    signals: Arc<IconSignals>,
}

impl Icon {
    /// Constructs an empty icon.
    pub fn new() -> Self {
        Self::attach(Shared::new(IconPrivate::default()))
    }

    fn attach(d: Shared<IconPrivate>) -> Self {
        let icon = Self {
            d,
            signals: Arc::new(IconSignals::default()),
        };
        icon.subscribe();
        icon
    }

    fn subscribe(&self) {
        self.d.observers.lock().push(Arc::downgrade(&self.signals));
    }

    fn unsubscribe(&self) {
        let me = Arc::as_ptr(&self.signals);
        self.d
            .observers
            .lock()
            .retain(|w| w.as_ptr() != me && w.strong_count() > 0);
    }

    /// A fully independent copy that shares nothing with `self`.
    pub fn copy(&self) -> Self {
        Self::attach(self.d.deep_copy())
    }

    /// Give this handle its own payload if it is shared.
    ///
    /// Returns `true` if a copy was made. Setters call this themselves.
    pub fn detach(&mut self) -> bool {
        if self.d.is_unique() {
            return false;
        }
        self.unsubscribe();
        self.d.detach();
        self.subscribe();
        true
    }

    /// How many handles share this icon's payload.
    pub fn ref_count(&self) -> usize {
        self.d.ref_count()
    }

    /// Whether both handles share one payload.
    pub fn shares_data_with(&self, other: &Icon) -> bool {
        self.d.ptr_eq(&other.d)
    }

    fn data_mut(&mut self) -> &mut IconData {
        self.detach();
        &mut self.d.make_mut().data
    }

    fn emit_image_changed(&self) {
        let image = self.current_image();
        for signals in self.observers() {
            signals.image_changed.emit(image.clone());
        }
    }

    fn emit_modified(&self) {
        for signals in self.observers() {
            signals.modified.emit(self.d.data.image.clone());
        }
    }

    fn observers(&self) -> Vec<Arc<IconSignals>> {
        self.d
            .observers
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

// ============================================================================
// Image and animation
// ============================================================================

impl Icon {
    /// Whether the icon has an animation (two or more frames).
    pub fn is_animated(&self) -> bool {
        self.d.data.animation.is_some()
    }

    /// The still image (frame 0 for animated icons).
    pub fn image(&self) -> &PixelImage {
        &self.d.data.image
    }

    /// The animation, if any.
    pub fn animation(&self) -> Option<&AnimatedImage> {
        self.d.data.animation.as_ref()
    }

    /// The image currently on display: the animation's current frame, or
    /// the still image.
    pub fn current_image(&self) -> PixelImage {
        match &self.d.data.animation {
            Some(animation) => animation
                .get_frame(self.current_frame_number())
                .map(|f| f.image().clone())
                .unwrap_or_else(|| self.d.data.image.clone()),
            None => self.d.data.image.clone(),
        }
    }

    /// The animation's current frame index, or 0.
    pub fn current_frame_number(&self) -> usize {
        self.d
            .playback
            .lock()
            .controller
            .as_ref()
            .map_or(0, AnimationController::current_frame)
    }

    /// Replace the still image.
    pub fn set_image(&mut self, image: PixelImage) {
        self.data_mut().image = image;
        self.emit_image_changed();
        self.emit_modified();
    }

    /// Replace the animation.
    ///
    /// The still image becomes the animation's first frame. Animations with
    /// fewer than two frames are not kept. If the icon is currently active
    /// the new animation starts playing from the beginning, with the active
    /// count reset to one.
    pub fn set_animation(&mut self, animation: AnimatedImage) {
        self.detach();
        let d = self.d.make_mut();
        d.data.image = animation.first_image();

        let playback = d.playback.get_mut();
        if animation.frame_count() < 2 {
            d.data.animation = None;
            playback.controller = None;
            playback.subscribed = false;
        } else {
            let mut controller = AnimationController::new_paused(&animation);
            if playback.active_count > 0 {
                playback.active_count = 1;
                playback.subscribed = true;
                controller.play();
            } else {
                playback.subscribed = false;
            }
            playback.controller = Some(controller);
            d.data.animation = Some(animation);
        }

        self.emit_image_changed();
        self.emit_modified();
    }

    /// Drop the animation, keeping the still image.
    pub fn remove_animation(&mut self) {
        if !self.is_animated() {
            return;
        }
        self.detach();
        let d = self.d.make_mut();
        d.data.animation = None;
        *d.playback.get_mut() = Playback::default();

        self.emit_image_changed();
    }

    /// Decode `data` into this icon.
    ///
    /// With `is_animation`, the data is first tried as an animation: its
    /// first frame becomes the still image and the animation is kept only if
    /// it has at least two frames. Otherwise, or if that fails, the data is
    /// decoded as a still image.
    ///
    /// Returns `false` if neither attempt produced an image; the icon keeps
    /// its previous image in that case.
    pub fn load_from_bytes(&mut self, data: &[u8], is_animation: bool) -> bool {
        self.detach();

        if is_animation {
            match AnimatedImage::from_bytes(data) {
                Ok(animation) => {
                    self.set_animation(animation);
                    return true;
                }
                Err(e) => {
                    tracing::trace!(target: targets::ICON, name = %self.name(), error = %e, "not an animation, trying still image");
                }
            }
        }

        match PixelImage::from_bytes(data) {
            Ok(image) => {
                self.set_image(image);
                true
            }
            Err(e) => {
                tracing::debug!(target: targets::ICON, name = %self.name(), error = %e, "image data did not decode");
                false
            }
        }
    }

    /// Remove the animation's first frame.
    ///
    /// Used when the first frame of an animated source is reserved for
    /// places that cannot animate. The still image is left as it was.
    pub fn strip_first_frame(&mut self) {
        if !self.is_animated() {
            return;
        }
        self.detach();
        let d = self.d.make_mut();
        if let Some(animation) = d.data.animation.as_mut() {
            animation.strip_first_frame();
            let playback = d.playback.get_mut();
            if let Some(controller) = playback.controller.as_mut() {
                let was_playing = controller.is_playing();
                *controller = AnimationController::new_paused(animation);
                if was_playing {
                    controller.play();
                }
            }
        }
        self.emit_image_changed();
    }
}

// ============================================================================
// Metadata
// ============================================================================

impl Icon {
    /// The icon's name.
    pub fn name(&self) -> &str {
        &self.d.data.name
    }

    /// Rename the icon.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.data_mut().name = name.into();
    }

    /// The search pattern, if any.
    pub fn pattern(&self) -> Option<&Regex> {
        self.d.data.pattern.as_ref()
    }

    /// Replace the search pattern.
    pub fn set_pattern(&mut self, pattern: Option<Regex>) {
        self.data_mut().pattern = pattern;
    }

    /// Localized text variants.
    pub fn text(&self) -> &IconText {
        &self.d.data.text
    }

    /// Replace the localized text.
    pub fn set_text(&mut self, text: IconText) {
        self.data_mut().text = text;
    }

    /// Path of the associated sound file.
    pub fn sound(&self) -> Option<&Path> {
        self.d.data.sound.as_deref()
    }

    /// Replace the associated sound file.
    pub fn set_sound(&mut self, sound: Option<PathBuf>) {
        self.data_mut().sound = sound;
    }
}

// ============================================================================
// Playback
// ============================================================================

impl Icon {
    /// Mark the icon as shown once more.
    ///
    /// Starts the animation, if any, so that [`advance`](Self::advance)
    /// moves it forward; repeated activation keeps a single driver. With
    /// `play_sound`, the icon's sound path is broadcast on
    /// [`SoundPrefs::play_sound`].
    ///
    /// Every call must be balanced by [`deactivate`](Self::deactivate).
    pub fn activate(&self, play_sound: bool) {
        {
            let mut playback = self.d.playback.lock();
            playback.active_count += 1;

            if let Some(animation) = &self.d.data.animation {
                let controller = playback
                    .controller
                    .get_or_insert_with(|| AnimationController::new_paused(animation));
                controller.play();
                playback.subscribed = true;
            }
        }

        if play_sound {
            if let Some(sound) = &self.d.data.sound {
                tracing::debug!(target: targets::ICON, name = %self.name(), sound = %sound.display(), "play sound");
                SoundPrefs::global().play_sound().emit(sound.clone());
            }
        }
    }

    /// Mark the icon as no longer shown by one view.
    ///
    /// When nobody shows it any more, the animation is paused and rewound to
    /// its first frame. Extra calls are ignored.
    pub fn deactivate(&self) {
        let mut playback = self.d.playback.lock();
        if playback.active_count == 0 {
            return;
        }
        playback.active_count -= 1;

        if playback.active_count == 0 {
            if let Some(controller) = playback.controller.as_mut() {
                controller.pause();
                controller.reset();
            }
            playback.subscribed = false;
        }
    }

    /// How many views currently show the icon.
    pub fn active_count(&self) -> usize {
        self.d.playback.lock().active_count
    }

    /// Whether the animation is currently being driven.
    pub fn is_playing(&self) -> bool {
        self.d.playback.lock().subscribed
    }

    /// Move a running animation forward by `delta`.
    ///
    /// Returns `true` and notifies `image_changed` observers if the frame
    /// changed. Does nothing for inactive or still icons.
    pub fn advance(&self, delta: Duration) -> bool {
        let changed = {
            let mut playback = self.d.playback.lock();
            if !playback.subscribed {
                return false;
            }
            playback
                .controller
                .as_mut()
                .is_some_and(|controller| controller.update(delta))
        };

        if changed {
            self.emit_image_changed();
        }
        changed
    }
}

// ============================================================================
// Observers
// ============================================================================

impl Icon {
    /// This handle's notification signals.
    pub fn signals(&self) -> &IconSignals {
        &self.signals
    }

    /// Shorthand for `signals().image_changed()`.
    pub fn image_changed(&self) -> &Signal<PixelImage> {
        &self.signals.image_changed
    }

    /// Shorthand for `signals().modified()`.
    pub fn modified(&self) -> &Signal<PixelImage> {
        &self.signals.modified
    }

    /// Connect to `image_changed` on this handle.
    pub fn on_image_changed<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&PixelImage) + Send + Sync + 'static,
    {
        self.signals.image_changed.connect(slot)
    }

    /// Connect to `modified` on this handle.
    pub fn on_modified<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&PixelImage) + Send + Sync + 'static,
    {
        self.signals.modified.connect(slot)
    }

    /// Block (or unblock) this handle's notifications.
    ///
    /// Returns the previous state.
    pub fn block_signals(&self, blocked: bool) -> bool {
        let previous = self.signals.image_changed.set_blocked(blocked);
        self.signals.modified.set_blocked(blocked);
        previous
    }
}

impl Default for Icon {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Icon {
    /// Shares the payload. The new handle starts with no observers.
    fn clone(&self) -> Self {
        Self::attach(self.d.share())
    }
}

impl Drop for Icon {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Icon")
            .field("name", &self.name())
            .field("image", self.image())
            .field("animated", &self.is_animated())
            .field("sound", &self.sound())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
