//! A single decodable video in the comparison set.
//!
//! [`VideoSource`] wraps a [`FrameDecoder`] with the verified frame count and
//! the row of [`FrameSlot`]s sampled from it. Sources are identified by path.
//!
//! # Example
//!
//! ```no_run
//! use frame_compare::{FfmpegDecoderFactory, FrameType, SamplingOptions, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4", &FfmpegDecoderFactory)?;
//! let options = SamplingOptions::new();
//! source.sampler(&options).sample_all(&[0, 100, 200], FrameType::I)?;
//!
//! for slot in source.slots() {
//!     println!("{} -> {}", slot.requested_position(), slot.resolved_position());
//! }
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;

use crate::annotate::normalize_channels;
use crate::config::SamplingOptions;
use crate::decoder::{DecoderFactory, FrameDecoder};
use crate::error::FrameCompareError;
use crate::frame_type::FrameType;
use crate::sampler::SourceFrameSampler;
use crate::slot::FrameSlot;

/// One opened video, its verified length, and its sampled slots.
pub struct VideoSource {
    path: PathBuf,
    file_name: String,
    decoder: Box<dyn FrameDecoder>,
    total_frames: u64,
    cursor: u64,
    last_position: u64,
    pub(crate) slots: Vec<Arc<FrameSlot>>,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("total_frames", &self.total_frames)
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl VideoSource {
    /// Open a video and verify how many frames can actually be read.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::FileOpen`] if the decoder cannot open
    /// the path, or [`FrameCompareError::EmptySource`] if not a single frame
    /// is readable.
    pub fn open<P: AsRef<Path>>(path: P, factory: &dyn DecoderFactory) -> Result<Self, FrameCompareError> {
        let path = path.as_ref().to_path_buf();
        let decoder = factory.open(&path).map_err(|error| match error {
            FrameCompareError::FileOpen { .. } => error,
            other => FrameCompareError::FileOpen {
                path: path.clone(),
                reason: other.to_string(),
            },
        })?;
        Self::from_decoder(path, decoder)
    }

    /// Wrap an already opened decoder.
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoSource::open).
    pub fn from_decoder(path: PathBuf, decoder: Box<dyn FrameDecoder>) -> Result<Self, FrameCompareError> {
        if !decoder.is_open() {
            return Err(FrameCompareError::FileOpen {
                path,
                reason: "decoder reported a closed handle".to_string(),
            });
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut source = Self {
            path,
            file_name,
            decoder,
            total_frames: 0,
            cursor: 0,
            last_position: 0,
            slots: Vec::new(),
        };

        source.total_frames = source.verify_frame_count();
        if source.total_frames == 0 {
            log::warn!("Rejecting {}: no readable frames", source.path.display());
            return Err(FrameCompareError::EmptySource { path: source.path });
        }

        log::debug!(
            "Opened {} with {} readable frames (container reported {})",
            source.path.display(),
            source.total_frames,
            source.decoder.reported_frame_count(),
        );
        Ok(source)
    }

    /// Binary search for the last readable index below the reported count.
    ///
    /// Container frame counts overestimate often enough that trusting them
    /// would let the planner pick positions past the real end.
    fn verify_frame_count(&mut self) -> u64 {
        let reported = self.decoder.reported_frame_count();
        if reported == 0 || !self.is_readable(0) {
            return 0;
        }

        let mut low = 0;
        let mut high = reported - 1;
        if self.is_readable(high) {
            return reported;
        }
        high -= 1;

        while low < high {
            let mid = low + (high - low).div_ceil(2);
            if self.is_readable(mid) {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low + 1
    }

    fn is_readable(&mut self, position: u64) -> bool {
        let readable = self.decoder.seek(position).is_ok() && matches!(self.decoder.read_next(), Ok(Some(_)));
        log::trace!("Checking {} at {position}: {readable}", self.file_name);
        readable
    }

    /// Full path of the video.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used in overlays and messages.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Number of readable frames. Always at least 1.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Sampled slots, in the same order as the shared positions.
    pub fn slots(&self) -> &[Arc<FrameSlot>] {
        &self.slots
    }

    /// The slot at `index`, if sampled.
    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index).map(Arc::as_ref)
    }

    /// Drop every sampled slot.
    pub fn clear_slots(&mut self) {
        self.slots.clear();
    }

    /// Borrow a sampler that resolves and offsets this source's slots.
    pub fn sampler<'a>(&'a mut self, options: &'a SamplingOptions) -> SourceFrameSampler<'a> {
        SourceFrameSampler::new(self, options)
    }

    /// Move the decoder cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::FramePosition`] if the decoder is closed
    /// or rejects the position.
    pub fn seek(&mut self, position: u64) -> Result<(), FrameCompareError> {
        if !self.decoder.is_open() {
            return Err(self.position_error(position));
        }
        self.decoder.seek(position).map_err(|error| {
            log::debug!("Seek to {position} in {} failed: {error}", self.file_name);
            self.position_error(position)
        })?;
        self.cursor = position;
        Ok(())
    }

    /// Decode the frame under the cursor as RGB and advance the cursor.
    ///
    /// If the decoder reports that it landed past the cursor, the cursor
    /// follows it; [`last_position`](VideoSource::last_position) tells which
    /// frame came back.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::VideoCaptureFailed`] if the decoder is
    /// closed, or [`FrameCompareError::ImageRead`] if no frame data came back.
    pub fn read_next(&mut self) -> Result<RgbImage, FrameCompareError> {
        if !self.decoder.is_open() {
            return Err(FrameCompareError::VideoCaptureFailed {
                path: self.path.clone(),
            });
        }

        let position = self.cursor;
        match self.decoder.read_next()? {
            Some(mut image) => {
                normalize_channels(&mut image, self.decoder.channel_order());
                let landed = self.decoder.last_position().unwrap_or(position);
                self.last_position = landed;
                self.cursor = landed + 1;
                Ok(image)
            }
            None => Err(FrameCompareError::ImageRead {
                path: self.path.clone(),
                position,
            }),
        }
    }

    /// Index of the frame returned by the last successful [`read_next`](VideoSource::read_next).
    pub fn last_position(&self) -> u64 {
        self.last_position
    }

    /// Index the next [`read_next`](VideoSource::read_next) will return.
    pub(crate) fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Classify the frame returned by the last successful read.
    pub fn classify_current_frame(&self) -> FrameType {
        FrameType::from_tag(self.decoder.current_frame_type_tag())
    }

    fn position_error(&self, position: u64) -> FrameCompareError {
        FrameCompareError::FramePosition {
            path: self.path.clone(),
            position,
        }
    }
}
