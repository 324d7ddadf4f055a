//! # frame-compare
//!
//! Sample the same frames across several videos and compare them side by
//! side, to judge relative quality and encoding differences.
//!
//! `frame-compare` picks a shared set of frame positions with a seeded RNG,
//! resolves each position in every video to the nearest frame of a chosen
//! coded type (I, P or B), and burns a small information overlay into each
//! result. Decoding goes through the [`FrameDecoder`] trait; the default
//! backend is FFmpeg via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ### Interactive session
//!
//! ```no_run
//! use frame_compare::{ComparisonSession, Direction, SamplerEvent, SamplingOptions};
//!
//! let mut session = ComparisonSession::with_ffmpeg(SamplingOptions::new())?;
//! session.add_sources(["reference.mkv", "encode.mkv"])?;
//!
//! // Wait for the initial sample.
//! for event in session.events().clone().iter() {
//!     session.process_event(&event)?;
//!     if matches!(event, SamplerEvent::TaskFinished(_)) {
//!         break;
//!     }
//! }
//!
//! session.change_source(Direction::Forward);
//! let slot = session.current_frame().expect("sampled");
//! slot.image().save("encode_slot0.png").expect("writable");
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```
//!
//! ### Synchronous sampling
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use frame_compare::{SamplingCoordinator, SamplingOptions, Task};
//!
//! let mut coordinator = SamplingCoordinator::with_ffmpeg(SamplingOptions::new().with_seed(7));
//! coordinator.add_sources(&[PathBuf::from("a.mp4"), PathBuf::from("b.mp4")]);
//! coordinator.run(Task::Sample)?;
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```
//!
//! ## Features
//!
//! - **Deterministic positions**: same seed, same grid
//! - **Incremental reconciliation**: adding a shorter video only redraws the
//!   positions past its end
//! - **Frame-type search**: nearest I/P/B frame at or after each position
//! - **Manual offsets**: step any slot to the previous or next match
//! - **Failure isolation**: unreadable videos are evicted, the rest resampled
//! - **Background worker**: a single FIFO worker thread with snapshot reads
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | FFmpeg decoder backend and the `frame-compare` binary (default) |
//! | `rayon` | Sample the sources of a batch in parallel |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `ffmpeg` feature needs the FFmpeg development libraries installed on
//! your system.

pub mod annotate;
pub mod config;
pub mod coordinator;
pub mod decoder;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod frame_type;
pub mod planner;
pub mod progress;
pub mod sampler;
pub mod session;
pub mod slot;
pub mod source;
pub mod task;
#[cfg(feature = "ffmpeg")]
mod utilities;
pub mod validation;
pub mod worker;

pub use annotate::Align;
pub use config::{DEFAULT_SAMPLE_COUNT, DEFAULT_SEED, OverlayStyle, SamplingOptions};
pub use coordinator::{CoordinatorState, GridSnapshot, SamplingCoordinator, SourceSnapshot};
pub use decoder::{ChannelOrder, DecoderFactory, FrameDecoder};
pub use error::FrameCompareError;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegDecoder, FfmpegDecoderFactory, FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_type::{FrameType, ParseFrameTypeError};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{Direction, SourceFrameSampler};
pub use session::{ComparisonSession, SourceAddition};
pub use slot::FrameSlot;
pub use source::VideoSource;
pub use task::{SamplerEvent, Setting, Task};
pub use worker::SamplingWorker;
