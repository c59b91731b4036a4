//! Animated image support.
//!
//! This module provides [`AnimatedImage`], a decoded frame sequence (GIF is
//! the only animated format), and [`AnimationController`], which tracks
//! where in that sequence playback currently is.
//!
//! # Example
//!
//! ```ignore
//! use iconset_render::{AnimatedImage, AnimationController};
//! use std::time::Duration;
//!
//! let animated = AnimatedImage::from_bytes(&gif_bytes)?;
//! let mut controller = AnimationController::new(&animated);
//!
//! // Each tick:
//! if controller.update(Duration::from_millis(16)) {
//!     let image = animated.get_frame(controller.current_frame()).map(|f| f.image());
//!     // Display the new frame...
//! }
//! ```

use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};

use crate::error::{RenderError, RenderResult};
use crate::pixel_image::PixelImage;

/// Delay used for frames that declare none.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// A single frame in an animation.
#[derive(Clone, PartialEq, Eq)]
pub struct AnimationFrame {
    /// The fully composed frame at canvas size.
    image: PixelImage,
    /// Delay before showing the next frame.
    delay: Duration,
}

impl AnimationFrame {
    /// Create a frame from an image and its display delay.
    pub fn new(image: PixelImage, delay: Duration) -> Self {
        Self { image, delay }
    }

    /// The frame's pixels.
    #[inline]
    pub fn image(&self) -> &PixelImage {
        &self.image
    }

    /// Get the delay before showing the next frame.
    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl std::fmt::Debug for AnimationFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationFrame")
            .field("dimensions", &format!("{}x{}", self.image.width(), self.image.height()))
            .field("delay", &self.delay)
            .finish()
    }
}

/// An animated image containing multiple frames. Playback always loops.
#[derive(Clone, PartialEq, Eq)]
pub struct AnimatedImage {
    /// All frames in the animation.
    frames: Vec<AnimationFrame>,
}

impl AnimatedImage {
    /// Decode an animated image from bytes in memory.
    ///
    /// Currently supports GIF. Every frame is decoded and composed onto the
    /// full canvas up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a GIF, a frame is corrupted, or the
    /// stream holds no frames at all.
    pub fn from_bytes(data: &[u8]) -> RenderResult<Self> {
        let decoder = GifDecoder::new(Cursor::new(data)).map_err(|e| {
            RenderError::ImageLoad(format!("Failed to decode animated image: {}", e))
        })?;
        let (width, height) = decoder.dimensions();

        let mut frames = Vec::new();
        for frame_result in decoder.into_frames() {
            let frame = frame_result
                .map_err(|e| RenderError::ImageLoad(format!("Failed to decode frame: {}", e)))?;

            let (num, denom) = frame.delay().numer_denom_ms();
            let delay_ms = if denom > 0 { num / denom } else { 0 };
            let delay = match delay_ms {
                0 => DEFAULT_FRAME_DELAY,
                ms => Duration::from_millis(ms as u64),
            };

            frames.push(AnimationFrame {
                image: PixelImage::from_rgba_image(frame.into_buffer()),
                delay,
            });
        }

        tracing::trace!(
            target: "iconset_render",
            width,
            height,
            frames = frames.len(),
            "decoded animation"
        );
        Self::from_frames(frames)
    }

    /// Build an animation from already decoded frames.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NoFrames`] if `frames` is empty.
    pub fn from_frames(frames: Vec<AnimationFrame>) -> RenderResult<Self> {
        if frames.is_empty() {
            return Err(RenderError::NoFrames);
        }
        Ok(Self { frames })
    }

    /// Get the number of frames in the animation.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get a specific frame by index, returning None if out of bounds.
    #[inline]
    pub fn get_frame(&self, index: usize) -> Option<&AnimationFrame> {
        self.frames.get(index)
    }

    /// The first frame's image, or the null image for an emptied animation.
    pub fn first_image(&self) -> PixelImage {
        self.frames
            .first()
            .map(|f| f.image.clone())
            .unwrap_or_default()
    }

    /// Get the total duration of one loop of the animation.
    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }

    /// Remove the first frame.
    ///
    /// Returns `false` (and leaves the animation untouched) when there is no
    /// frame to remove.
    pub fn strip_first_frame(&mut self) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        self.frames.remove(0);
        true
    }
}

impl std::fmt::Debug for AnimatedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedImage")
            .field("frames", &self.frames.len())
            .field("total_duration", &self.total_duration())
            .finish()
    }
}

/// Playback state for an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Animation is playing.
    Playing,
    /// Animation is paused.
    Paused,
}

/// Controls playback of an animated image.
///
/// The controller tracks the current frame, elapsed time, and playback state.
/// Call `update()` with the elapsed time to advance the animation.
#[derive(Clone)]
pub struct AnimationController {
    /// Current frame index.
    current_frame: usize,
    /// Time elapsed in the current frame.
    frame_elapsed: Duration,
    /// Current playback state.
    state: PlaybackState,
    /// Frame delays (cached from AnimatedImage), never zero.
    frame_delays: Vec<Duration>,
}

impl AnimationController {
    /// Create a new animation controller for the given animated image.
    ///
    /// The controller starts in the `Playing` state at frame 0.
    pub fn new(animated: &AnimatedImage) -> Self {
        Self {
            current_frame: 0,
            frame_elapsed: Duration::ZERO,
            state: PlaybackState::Playing,
            frame_delays: animated
                .frames
                .iter()
                .map(|f| f.delay.max(Duration::from_millis(1)))
                .collect(),
        }
    }

    /// Create a new animation controller that starts paused.
    pub fn new_paused(animated: &AnimatedImage) -> Self {
        let mut controller = Self::new(animated);
        controller.state = PlaybackState::Paused;
        controller
    }

    /// Update the animation with elapsed time.
    ///
    /// Returns `true` if the frame changed, `false` otherwise.
    pub fn update(&mut self, delta: Duration) -> bool {
        if self.state != PlaybackState::Playing || self.frame_delays.is_empty() {
            return false;
        }

        self.frame_elapsed += delta;
        let mut advanced = false;

        loop {
            let current_delay = self.frame_delays[self.current_frame];
            if self.frame_elapsed < current_delay {
                break;
            }
            self.frame_elapsed -= current_delay;
            advanced = true;

            self.current_frame = (self.current_frame + 1) % self.frame_delays.len();
        }

        advanced && self.frame_delays.len() > 1
    }

    /// Get the current frame index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Get the current playback state.
    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if the animation is playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Start or resume playback.
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Reset the animation to the beginning.
    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.frame_elapsed = Duration::ZERO;
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("current_frame", &self.current_frame)
            .field("state", &self.state)
            .finish()
    }
}
