//! Interactive comparison session.
//!
//! [`ComparisonSession`] is the handle a front end holds. It owns the
//! sampling worker, tracks which source and slot the user is looking at, and
//! reads frames from the latest published snapshot. Sampling runs on the
//! worker and completion is reported through
//! [`events`](ComparisonSession::events). The one exception is
//! [`add_sources`](ComparisonSession::add_sources), which opens each file and
//! verifies its frame count before returning.
//!
//! # Example
//!
//! ```no_run
//! use frame_compare::{ComparisonSession, SamplerEvent, SamplingOptions};
//!
//! let mut session = ComparisonSession::with_ffmpeg(SamplingOptions::new())?;
//! session.add_sources(["a.mp4", "b.mkv"])?;
//!
//! for event in session.events().clone().iter() {
//!     session.process_event(&event)?;
//!     if let SamplerEvent::TaskFinished(_) = event {
//!         break;
//!     }
//! }
//!
//! if let Some(slot) = session.current_frame() {
//!     println!("showing frame {}", slot.resolved_position());
//! }
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::config::SamplingOptions;
use crate::coordinator::{GridSnapshot, SamplingCoordinator};
use crate::decoder::DecoderFactory;
use crate::error::FrameCompareError;
use crate::frame_type::FrameType;
use crate::sampler::Direction;
use crate::slot::FrameSlot;
use crate::source::VideoSource;
use crate::task::{SamplerEvent, Setting, Task};
use crate::validation::validate_path;
use crate::worker::SamplingWorker;

/// Result of adding one path to a session.
#[derive(Debug)]
pub struct SourceAddition {
    /// The path as given.
    pub path: PathBuf,
    /// Why the path was rejected, if it was.
    pub error: Option<FrameCompareError>,
}

impl SourceAddition {
    /// Whether the source joined the session.
    pub fn is_added(&self) -> bool {
        self.error.is_none()
    }
}

/// Front-end handle over the sampling worker.
pub struct ComparisonSession {
    factory: Arc<dyn DecoderFactory>,
    worker: SamplingWorker,
    paths: Vec<PathBuf>,
    current_source: usize,
    current_slot: usize,
    sample_count: usize,
    frame_type: FrameType,
}

impl ComparisonSession {
    /// Start a session whose sources are opened through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::IoError`] if the worker thread cannot
    /// be spawned.
    pub fn new(factory: Arc<dyn DecoderFactory>, options: SamplingOptions) -> Result<Self, FrameCompareError> {
        let sample_count = options.sample_count();
        let frame_type = options.frame_type();
        let coordinator = SamplingCoordinator::new(Arc::clone(&factory), options);
        Ok(Self {
            factory,
            worker: SamplingWorker::spawn(coordinator)?,
            paths: Vec::new(),
            current_source: 0,
            current_slot: 0,
            sample_count,
            frame_type,
        })
    }

    /// Start a session backed by FFmpeg.
    ///
    /// # Errors
    ///
    /// See [`new`](ComparisonSession::new).
    #[cfg(feature = "ffmpeg")]
    pub fn with_ffmpeg(options: SamplingOptions) -> Result<Self, FrameCompareError> {
        Self::new(Arc::new(crate::ffmpeg::FfmpegDecoderFactory), options)
    }

    /// Validate, open and add `paths`, then queue a sample.
    ///
    /// Paths are opened on the calling thread so that unreadable files are
    /// reported immediately. Opening decodes a handful of frames near the
    /// end of each file to verify its frame count, so this call blocks for
    /// as long as that takes. Nothing is queued when no path was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    /// Per-path rejections are reported in the returned list instead.
    pub fn add_sources<I, P>(&mut self, paths: I) -> Result<Vec<SourceAddition>, FrameCompareError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut additions = Vec::new();
        let mut opened = Vec::new();

        for path in paths {
            let path = path.as_ref().to_path_buf();
            let result = self.open_source(&path, &opened);
            match result {
                Ok(source) => {
                    opened.push(source);
                    additions.push(SourceAddition { path, error: None });
                }
                Err(error) => {
                    log::warn!("Rejecting {}: {error}", path.display());
                    additions.push(SourceAddition {
                        path,
                        error: Some(error),
                    });
                }
            }
        }

        if !opened.is_empty() {
            let added: Vec<PathBuf> = opened.iter().map(|source| source.path().to_path_buf()).collect();
            self.worker.add_sources(opened)?;
            self.paths.extend(added);
            self.worker.run(Task::Sample)?;
        }
        Ok(additions)
    }

    fn open_source(&self, path: &Path, pending: &[VideoSource]) -> Result<VideoSource, FrameCompareError> {
        if self.paths.iter().any(|known| known == path) || pending.iter().any(|source| source.path() == path) {
            return Err(FrameCompareError::UnsupportedPath {
                path: path.to_path_buf(),
                reason: "already loaded".to_string(),
            });
        }
        validate_path(path)?;
        VideoSource::open(path, self.factory.as_ref())
    }

    /// Remove a source, returning its former index.
    ///
    /// The source cursor moves back when it pointed past the new end; both
    /// cursors reset when no source is left.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn delete_source<P: AsRef<Path>>(&mut self, path: P) -> Result<Option<usize>, FrameCompareError> {
        let path = path.as_ref();
        let Some(index) = self.paths.iter().position(|known| known == path) else {
            return Ok(None);
        };

        self.paths.remove(index);
        if self.paths.is_empty() {
            self.current_source = 0;
            self.current_slot = 0;
        } else if self.current_source >= self.paths.len() {
            self.current_source = self.paths.len() - 1;
        }

        self.worker.remove_source(path.to_path_buf())?;
        Ok(Some(index))
    }

    /// Keep the visible source list in step with the worker.
    ///
    /// Sources the worker evicted are deleted from the session. Other events
    /// need no bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn process_event(&mut self, event: &SamplerEvent) -> Result<(), FrameCompareError> {
        if let SamplerEvent::TaskFailedInvalidSources(paths) = event {
            for path in paths {
                self.delete_source(path)?;
            }
        }
        Ok(())
    }

    /// Queue a sample against the current positions.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn sample(&self) -> Result<(), FrameCompareError> {
        self.worker.run(Task::Sample)
    }

    /// Queue a resample with freshly drawn positions.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn resample(&self) -> Result<(), FrameCompareError> {
        self.worker.run(Task::Resample)
    }

    /// Queue an offset of the slot under the cursors.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn offset_current_frame(&self, direction: Direction) -> Result<(), FrameCompareError> {
        self.worker.run(Task::Offset {
            direction,
            source_index: self.current_source,
            slot_index: self.current_slot,
        })
    }

    /// Queue an offset of every slot of the current source.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn offset_all_frames(&self, direction: Direction) -> Result<(), FrameCompareError> {
        self.worker.run(Task::OffsetAll {
            direction,
            source_index: self.current_source,
        })
    }

    /// Change the seed. Follow with [`resample`](ComparisonSession::resample).
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn update_seed(&self, seed: u64) -> Result<(), FrameCompareError> {
        self.worker.configure(Setting::Seed(seed))
    }

    /// Change the sample count. Follow with [`sample`](ComparisonSession::sample).
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn update_sample_count(&mut self, count: usize) -> Result<(), FrameCompareError> {
        self.sample_count = count;
        if self.current_slot >= count {
            self.current_slot = count.saturating_sub(1);
        }
        self.worker.configure(Setting::SampleCount(count))
    }

    /// Change the frame type and resample if it differs. Returns whether it did.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](ComparisonSession::stop).
    pub fn set_frame_type(&mut self, frame_type: FrameType) -> Result<bool, FrameCompareError> {
        if self.frame_type == frame_type {
            return Ok(false);
        }
        self.frame_type = frame_type;
        self.worker.configure(Setting::FrameType(frame_type))?;
        self.worker.run(Task::Resample)?;
        Ok(true)
    }

    /// Move the slot cursor one step, wrapping at either end.
    pub fn change_frame(&mut self, direction: Direction) {
        self.current_slot = step_cyclic(self.current_slot, self.sample_count, direction);
    }

    /// Move the source cursor one step, wrapping at either end.
    pub fn change_source(&mut self, direction: Direction) {
        self.current_source = step_cyclic(self.current_source, self.paths.len(), direction);
    }

    /// Index of the source under the cursor.
    pub fn current_source(&self) -> usize {
        self.current_source
    }

    /// Index of the slot under the cursor.
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Frame type the session samples for.
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Sources as the session sees them, in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The latest published grid.
    pub fn snapshot(&self) -> Arc<GridSnapshot> {
        self.worker.snapshot()
    }

    /// The slot at `(source_index, slot_index)` in the latest grid.
    pub fn frame(&self, source_index: usize, slot_index: usize) -> Option<Arc<FrameSlot>> {
        self.worker.snapshot().frame(source_index, slot_index)
    }

    /// The slot under the cursors.
    pub fn current_frame(&self) -> Option<Arc<FrameSlot>> {
        self.frame(self.current_source, self.current_slot)
    }

    /// Task notifications from the worker.
    pub fn events(&self) -> &Receiver<SamplerEvent> {
        self.worker.events()
    }

    /// Let queued work finish, then stop the worker. Also runs on drop.
    pub fn stop(&mut self) {
        self.worker.stop();
    }
}

fn step_cyclic(index: usize, length: usize, direction: Direction) -> usize {
    if length == 0 {
        return 0;
    }
    match direction {
        Direction::Forward => (index + 1) % length,
        Direction::Backward => (index + length - 1) % length,
    }
}
