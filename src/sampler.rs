//! Per-source nearest-match search.
//!
//! A [`SourceFrameSampler`] resolves requested positions to the nearest frame
//! of a given [`FrameType`] and steps individual slots to the neighbouring
//! match. Scans never wrap: reaching either end of the video without a match
//! is [`FrameCompareError::NoMatchingFrameType`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use image::RgbImage;

use crate::annotate::annotate_frame;
use crate::config::SamplingOptions;
use crate::error::FrameCompareError;
use crate::frame_type::FrameType;
use crate::progress::{OperationType, ProgressTracker};
use crate::slot::FrameSlot;
use crate::source::VideoSource;

/// Scan direction for offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward frame 0.
    Backward = -1,
    /// Toward the last frame.
    Forward = 1,
}

impl Direction {
    /// Signed step, `-1` or `1`.
    pub fn step(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Direction {
    type Error = FrameCompareError;

    fn try_from(step: i64) -> Result<Self, Self::Error> {
        match step {
            -1 => Ok(Direction::Backward),
            1 => Ok(Direction::Forward),
            other => Err(FrameCompareError::InvalidDirection(other)),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Direction::Backward => f.write_str("backward"),
            Direction::Forward => f.write_str("forward"),
        }
    }
}

/// Borrowed view over a [`VideoSource`] that resolves its slots.
///
/// Obtained with [`VideoSource::sampler`].
pub struct SourceFrameSampler<'a> {
    source: &'a mut VideoSource,
    options: &'a SamplingOptions,
    frames_decoded: u64,
}

impl<'a> SourceFrameSampler<'a> {
    pub(crate) fn new(source: &'a mut VideoSource, options: &'a SamplingOptions) -> Self {
        Self {
            source,
            options,
            frames_decoded: 0,
        }
    }

    /// Frames decoded through this sampler so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Resolve one slot per requested position.
    ///
    /// Slots whose requested position and frame type are unchanged are kept
    /// as they are. The new row is committed only if every position resolved.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::NoMatchingFrameType`] if a forward scan
    /// reaches the end of the video, or the read error of the source. The
    /// existing slots are left untouched in both cases.
    pub fn sample_all(&mut self, requested: &[u64], frame_type: FrameType) -> Result<(), FrameCompareError> {
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.options.progress),
            OperationType::Sampling,
            self.source.file_name(),
            Some(requested.len() as u64),
        );

        let mut resolved = Vec::with_capacity(requested.len());
        for (index, &position) in requested.iter().enumerate() {
            let reusable = self
                .source
                .slots
                .get(index)
                .filter(|slot| slot.satisfies(position, frame_type));

            if let Some(slot) = reusable {
                resolved.push(Arc::clone(slot));
            } else {
                let decoded_before = self.frames_decoded;
                let (position_found, image) = self.scan_forward(position, frame_type)?;
                tracker.record_decoded(self.frames_decoded - decoded_before);
                resolved.push(Arc::new(self.build_slot(position, position_found, frame_type, image)));
            }
            tracker.advance();
        }

        self.source.slots = resolved;
        Ok(())
    }

    /// Step slot `slot_index` to the next matching frame in `direction`.
    ///
    /// The search starts one frame away from the slot's resolved position
    /// and keeps the slot's frame type.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::SlotOutOfRange`] for a bad index, or
    /// [`FrameCompareError::NoMatchingFrameType`] when the scan reaches a
    /// boundary. The slot is unchanged on failure.
    pub fn offset(&mut self, slot_index: usize, direction: Direction) -> Result<(), FrameCompareError> {
        let count = self.source.slots.len();
        let slot = self
            .source
            .slots
            .get(slot_index)
            .ok_or(FrameCompareError::SlotOutOfRange {
                index: slot_index,
                count,
            })?;
        let frame_type = slot.frame_type();
        let resolved = slot.resolved_position();

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.options.progress),
            OperationType::Offsetting,
            self.source.file_name(),
            Some(1),
        );
        let decoded_before = self.frames_decoded;

        let (start, (position_found, image)) = match direction {
            Direction::Forward => {
                let start = resolved + 1;
                (start, self.scan_forward(start, frame_type)?)
            }
            Direction::Backward => {
                let start = resolved
                    .checked_sub(1)
                    .ok_or(FrameCompareError::NoMatchingFrameType { frame_type })?;
                (start, self.scan_backward(start, frame_type)?)
            }
        };

        log::debug!(
            "Offset {} slot {slot_index} {direction}: {resolved} -> {position_found}",
            self.source.file_name(),
        );

        let slot = self.build_slot(start, position_found, frame_type, image);
        self.source.slots[slot_index] = Arc::new(slot);
        tracker.record_decoded(self.frames_decoded - decoded_before);
        tracker.advance();
        Ok(())
    }

    /// Offset every slot of the source.
    ///
    /// Every slot is attempted. Slots without a match keep their state.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::NoMatchingFrameType`] if at least one
    /// slot had no match, or the first read error, which aborts the loop.
    pub fn offset_all(&mut self, direction: Direction) -> Result<(), FrameCompareError> {
        let mut unmatched = None;
        for slot_index in 0..self.source.slots.len() {
            match self.offset(slot_index, direction) {
                Ok(()) => {}
                Err(FrameCompareError::NoMatchingFrameType { frame_type }) => {
                    unmatched.get_or_insert(frame_type);
                }
                Err(error) => return Err(error),
            }
        }

        match unmatched {
            Some(frame_type) => Err(FrameCompareError::NoMatchingFrameType { frame_type }),
            None => Ok(()),
        }
    }

    /// Seek once, then read sequentially until a frame of `frame_type`.
    ///
    /// Positions come from the source, so a decoder that skips over a gap is
    /// labelled with the frame it actually returned.
    fn scan_forward(&mut self, start: u64, frame_type: FrameType) -> Result<(u64, RgbImage), FrameCompareError> {
        let total = self.source.total_frames();
        if start >= total {
            return Err(FrameCompareError::NoMatchingFrameType { frame_type });
        }

        self.source.seek(start)?;
        while self.source.cursor() < total {
            let image = self.source.read_next()?;
            self.frames_decoded += 1;
            let position = self.source.last_position();
            if position >= total {
                break;
            }
            let found = self.source.classify_current_frame();
            log::trace!("{} frame {position} is {found}", self.source.file_name());
            if found == frame_type {
                return Ok((position, image));
            }
        }

        Err(FrameCompareError::NoMatchingFrameType { frame_type })
    }

    /// Re-seek on every step down to frame 0.
    fn scan_backward(&mut self, start: u64, frame_type: FrameType) -> Result<(u64, RgbImage), FrameCompareError> {
        let start = start.min(self.source.total_frames().saturating_sub(1));
        for requested in (0..=start).rev() {
            self.source.seek(requested)?;
            let image = self.source.read_next()?;
            self.frames_decoded += 1;
            let position = self.source.last_position();
            // Landing past the starting frame would step the slot the wrong way.
            if position > start {
                continue;
            }
            let found = self.source.classify_current_frame();
            log::trace!("{} frame {position} is {found}", self.source.file_name());
            if found == frame_type {
                return Ok((position, image));
            }
        }

        Err(FrameCompareError::NoMatchingFrameType { frame_type })
    }

    fn build_slot(&self, requested: u64, resolved: u64, frame_type: FrameType, mut image: RgbImage) -> FrameSlot {
        annotate_frame(
            &mut image,
            &self.options.overlay,
            self.source.file_name(),
            frame_type,
            resolved,
            self.source.total_frames(),
        );
        FrameSlot::new(requested, resolved, frame_type, image)
    }
}
