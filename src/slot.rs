//! One sampled comparison position for one source.

use image::RgbImage;

use crate::frame_type::FrameType;

/// A resolved, annotated frame occupying one slot of a source's grid row.
///
/// Slots are replaced as a whole; there are no setters. `frame_type` always
/// equals the type that was requested when the slot was resolved.
#[derive(Debug, Clone)]
pub struct FrameSlot {
    requested_position: u64,
    resolved_position: u64,
    frame_type: FrameType,
    image: RgbImage,
}

impl FrameSlot {
    pub(crate) fn new(
        requested_position: u64,
        resolved_position: u64,
        frame_type: FrameType,
        image: RgbImage,
    ) -> Self {
        Self {
            requested_position,
            resolved_position,
            frame_type,
            image,
        }
    }

    /// Position the search started from.
    pub fn requested_position(&self) -> u64 {
        self.requested_position
    }

    /// Index of the frame that matched.
    pub fn resolved_position(&self) -> u64 {
        self.resolved_position
    }

    /// Frame type of the matched frame.
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// The decoded frame with the overlay burned in.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Whether this slot already answers a request for `position` and
    /// `frame_type`, so it can be kept without decoding.
    pub(crate) fn satisfies(&self, position: u64, frame_type: FrameType) -> bool {
        self.requested_position == position && self.frame_type == frame_type
    }
}
