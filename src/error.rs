//! Error types for the `frame-compare` crate.
//!
//! This module defines [`FrameCompareError`], the unified error type returned
//! by all fallible operations in the crate. Errors carry the source path and
//! frame position involved so that the caller can tell which video to evict
//! and what to show the user.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

use crate::frame_type::FrameType;

/// The unified error type for all `frame-compare` operations.
///
/// Every public method that can fail returns `Result<T, FrameCompareError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameCompareError {
    /// The video could not be opened by the decoder.
    #[error("Failed to open video at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the decoder factory.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The video opened but not a single frame could be read from it.
    #[error("Video at {path} has no readable frames")]
    EmptySource {
        /// Path of the rejected video.
        path: PathBuf,
    },

    /// The path was rejected before any decoding was attempted.
    #[error("Unsupported path {path}: {reason}")]
    UnsupportedPath {
        /// The rejected path.
        path: PathBuf,
        /// Why the path is not acceptable.
        reason: String,
    },

    /// An operation was attempted on a decoder that is not open.
    #[error("Video capture not opened for {path}")]
    VideoCaptureFailed {
        /// Path of the source whose decoder is closed.
        path: PathBuf,
    },

    /// The decoder refused to position itself at the requested frame.
    #[error("Could not set frame at position {position} in {path}")]
    FramePosition {
        /// Path of the source.
        path: PathBuf,
        /// The rejected frame position.
        position: u64,
    },

    /// Seeking succeeded but no frame data came back.
    #[error("Could not read image at position {position} from {path}")]
    ImageRead {
        /// Path of the source.
        path: PathBuf,
        /// Position the decoder cursor was at.
        position: u64,
    },

    /// A scan reached the start or end of a video without finding a frame of
    /// the requested type.
    #[error("Could not find frame that matches type {frame_type}")]
    NoMatchingFrameType {
        /// The frame type that was searched for.
        frame_type: FrameType,
    },

    /// An offset step other than `+1` or `-1` was supplied.
    #[error("Invalid offset value: {0}")]
    InvalidDirection(i64),

    /// One or more sources could not be read during a batch operation.
    ///
    /// The listed sources have already been evicted from the active set by
    /// the time this error is returned.
    #[error("Could not read image from one or multiple sources: {}", display_paths(.paths))]
    InvalidSources {
        /// Paths of every source that failed.
        paths: Vec<PathBuf>,
    },

    /// The requested source index is out of range.
    #[error("Source {index} is out of range ({count} sources loaded)")]
    SourceOutOfRange {
        /// Requested source index.
        index: usize,
        /// Number of active sources.
        count: usize,
    },

    /// The requested slot index is out of range.
    #[error("Slot {index} is out of range ({count} slots sampled)")]
    SlotOutOfRange {
        /// Requested slot index.
        index: usize,
        /// Number of sampled slots.
        count: usize,
    },

    /// The background worker has shut down and no longer accepts commands.
    #[error("Sampling worker has stopped")]
    WorkerStopped,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while inspecting a path.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl FrameCompareError {
    /// Returns `true` for failures that make the source itself unusable.
    ///
    /// These are collected during batch sampling and cause the source to be
    /// evicted. A missing frame type is not one of them: the video is fine,
    /// it just lacks that type in the scanned range.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            FrameCompareError::FileOpen { .. }
                | FrameCompareError::EmptySource { .. }
                | FrameCompareError::VideoCaptureFailed { .. }
                | FrameCompareError::FramePosition { .. }
                | FrameCompareError::ImageRead { .. }
                | FrameCompareError::FfmpegError(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for FrameCompareError {
    fn from(error: ffmpeg_next::Error) -> Self {
        FrameCompareError::FfmpegError(error.to_string())
    }
}
