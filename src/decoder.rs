//! The decoding seam.
//!
//! Container parsing and decoding live behind [`FrameDecoder`]. The sampling
//! engine only ever asks a decoder to position itself at a frame index, hand
//! back the frame under the cursor, and report that frame's picture-type tag.
//! [`DecoderFactory`] opens decoders by path so that sources can be created
//! from a list of files.
//!
//! The FFmpeg backend ([`FfmpegDecoderFactory`](crate::FfmpegDecoderFactory))
//! is the default; tests and embedders can provide their own.

use std::path::Path;

use image::RgbImage;

use crate::error::FrameCompareError;

/// Channel layout of the images a decoder returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue. No conversion needed for display.
    #[default]
    Rgb,
    /// Blue, green, red. Swapped to RGB before the image reaches a slot.
    Bgr,
}

/// A stateful, seekable frame reader for one video.
///
/// The decoder keeps a cursor. [`seek`](FrameDecoder::seek) moves it and
/// [`read_next`](FrameDecoder::read_next) returns the frame under it and
/// advances it by one, so a run of sequential reads after a single seek visits
/// consecutive frames.
pub trait FrameDecoder: Send {
    /// Whether the underlying handle is open and usable.
    fn is_open(&self) -> bool;

    /// Frame count as reported by the container. May overestimate.
    fn reported_frame_count(&self) -> u64;

    /// Move the cursor to `position` (0-indexed).
    fn seek(&mut self, position: u64) -> Result<(), FrameCompareError>;

    /// Decode the frame under the cursor and advance the cursor.
    ///
    /// Returns `Ok(None)` when no frame data is available at the cursor, for
    /// instance past the real end of the stream.
    fn read_next(&mut self) -> Result<Option<RgbImage>, FrameCompareError>;

    /// Picture-type tag of the frame returned by the last successful
    /// [`read_next`](FrameDecoder::read_next), e.g. `b'I'`.
    fn current_frame_type_tag(&self) -> u8;

    /// Index of the frame returned by the last successful
    /// [`read_next`](FrameDecoder::read_next).
    ///
    /// Decoders that can land past the cursor, for instance when timestamps
    /// have gaps, report where they actually are. `None` means the frame was
    /// the one under the cursor.
    fn last_position(&self) -> Option<u64> {
        None
    }

    /// Channel layout of the images returned by [`read_next`](FrameDecoder::read_next).
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }
}

/// Opens a [`FrameDecoder`] for a path.
pub trait DecoderFactory: Send + Sync {
    /// Open a decoder for the video at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameDecoder>, FrameCompareError>;
}

impl<F> DecoderFactory for F
where
    F: Fn(&Path) -> Result<Box<dyn FrameDecoder>, FrameCompareError> + Send + Sync,
{
    fn open(&self, path: &Path) -> Result<Box<dyn FrameDecoder>, FrameCompareError> {
        self(path)
    }
}
