//! Sampling configuration.
//!
//! [`SamplingOptions`] is a builder that carries the startup sampling
//! parameters (sample count, seed, frame type), the overlay settings and the
//! progress callback through the coordinator and samplers without widening
//! every function signature.
//!
//! # Example
//!
//! ```
//! use frame_compare::{FrameType, SamplingOptions};
//!
//! let options = SamplingOptions::new()
//!     .with_sample_count(8)
//!     .with_seed(7)
//!     .with_frame_type(FrameType::I)
//!     .with_overlay_scale(3);
//!
//! assert_eq!(options.sample_count(), 8);
//! assert_eq!(options.frame_type(), FrameType::I);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use image::Rgb;

use crate::frame_type::FrameType;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default number of sampled positions.
pub const DEFAULT_SAMPLE_COUNT: usize = 5;

/// Default planner seed.
pub const DEFAULT_SEED: u64 = 42;

/// How the information text is drawn onto sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Whether to draw the overlay at all.
    pub enabled: bool,
    /// Integer scale applied to the 8x8 glyphs.
    pub scale: u32,
    /// Fill colour of the glyphs.
    pub text_color: Rgb<u8>,
    /// Colour of the one-pixel (times scale) outline around each glyph.
    pub border_color: Rgb<u8>,
    /// Distance in pixels from the image edges.
    pub margin: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 2,
            text_color: Rgb([255, 255, 255]),
            border_color: Rgb([0, 0, 0]),
            margin: 8,
        }
    }
}

/// Sampling parameters shared by every source in a comparison.
#[derive(Clone)]
pub struct SamplingOptions {
    pub(crate) sample_count: usize,
    pub(crate) seed: u64,
    pub(crate) frame_type: FrameType,
    pub(crate) overlay: OverlayStyle,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("sample_count", &self.sample_count)
            .field("seed", &self.seed)
            .field("frame_type", &self.frame_type)
            .field("overlay", &self.overlay)
            .field("has_progress", &true)
            .finish()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// Create options with the default settings.
    ///
    /// Defaults: 5 samples, seed 42, B-type frames, overlay on, no progress
    /// callback.
    pub fn new() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            seed: DEFAULT_SEED,
            frame_type: FrameType::default(),
            overlay: OverlayStyle::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the number of sampled positions.
    #[must_use]
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the planner seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the frame type every slot must match.
    #[must_use]
    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }

    /// Replace the overlay style.
    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayStyle) -> Self {
        self.overlay = overlay;
        self
    }

    /// Turn the text overlay off. Frames are stored as decoded.
    #[must_use]
    pub fn without_overlay(mut self) -> Self {
        self.overlay.enabled = false;
        self
    }

    /// Set the glyph scale of the overlay. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_overlay_scale(mut self, scale: u32) -> Self {
        self.overlay.scale = scale.max(1);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Number of sampled positions.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Planner seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Frame type every slot must match.
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Overlay style.
    pub fn overlay(&self) -> &OverlayStyle {
        &self.overlay
    }
}
