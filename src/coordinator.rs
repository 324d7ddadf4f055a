//! Ownership of the active source set and the shared positions.
//!
//! [`SamplingCoordinator`] plans the shared positions against the shortest
//! source, runs the per-source samplers, and isolates failures: a source
//! that cannot be read is evicted and the rest of the batch is resampled
//! instead of the whole batch failing.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use frame_compare::{FfmpegDecoderFactory, SamplingCoordinator, SamplingOptions, Task};
//!
//! let mut coordinator =
//!     SamplingCoordinator::new(Arc::new(FfmpegDecoderFactory), SamplingOptions::new());
//! coordinator.add_sources(&[PathBuf::from("a.mp4"), PathBuf::from("b.mkv")]);
//! coordinator.run(Task::Sample)?;
//!
//! println!("positions: {:?}", coordinator.frame_positions());
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::SamplingOptions;
use crate::decoder::DecoderFactory;
use crate::error::FrameCompareError;
use crate::frame_type::FrameType;
use crate::planner;
use crate::sampler::Direction;
use crate::slot::FrameSlot;
use crate::source::VideoSource;
use crate::task::{Setting, Task};

/// Lifecycle of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// No sources loaded.
    #[default]
    Empty,
    /// Sources loaded and idle.
    Ready,
    /// A task is running.
    Sampling,
    /// Unreadable sources are being evicted.
    Failed,
}

/// Read-only view of one source inside a [`GridSnapshot`].
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// Full path of the video.
    pub path: PathBuf,
    /// Final path component.
    pub file_name: String,
    /// Readable frame count.
    pub total_frames: u64,
    /// Sampled slots.
    pub slots: Vec<Arc<FrameSlot>>,
}

/// Immutable copy of the comparison grid.
///
/// Images are shared with the coordinator, so taking a snapshot never copies
/// pixel data.
#[derive(Debug, Clone, Default)]
pub struct GridSnapshot {
    /// Active sources in insertion order.
    pub sources: Vec<SourceSnapshot>,
    /// Shared requested positions.
    pub positions: Vec<u64>,
    /// Coordinator state when the snapshot was taken.
    pub state: CoordinatorState,
    /// Frame type the slots were resolved for.
    pub frame_type: FrameType,
}

impl GridSnapshot {
    /// The slot at `(source_index, slot_index)`.
    pub fn frame(&self, source_index: usize, slot_index: usize) -> Option<Arc<FrameSlot>> {
        self.sources
            .get(source_index)
            .and_then(|source| source.slots.get(slot_index))
            .cloned()
    }

    /// Paths of the active sources.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|source| source.path.clone()).collect()
    }
}

/// Owns the sources and positions and executes [`Task`]s against them.
pub struct SamplingCoordinator {
    factory: Arc<dyn DecoderFactory>,
    options: SamplingOptions,
    sources: Vec<VideoSource>,
    positions: Vec<u64>,
    state: CoordinatorState,
}

impl Debug for SamplingCoordinator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingCoordinator")
            .field("options", &self.options)
            .field("sources", &self.sources)
            .field("positions", &self.positions)
            .field("state", &self.state)
            .finish()
    }
}

/// What a batch left behind once no more sources failed.
#[derive(Default)]
struct BatchOutcome {
    evicted: Vec<PathBuf>,
    unmatched: Option<FrameType>,
}

impl SamplingCoordinator {
    /// Create an empty coordinator that opens sources through `factory`.
    pub fn new(factory: Arc<dyn DecoderFactory>, options: SamplingOptions) -> Self {
        Self {
            factory,
            options,
            sources: Vec::new(),
            positions: Vec::new(),
            state: CoordinatorState::Empty,
        }
    }

    /// Create an empty coordinator backed by FFmpeg.
    #[cfg(feature = "ffmpeg")]
    pub fn with_ffmpeg(options: SamplingOptions) -> Self {
        Self::new(Arc::new(crate::ffmpeg::FfmpegDecoderFactory), options)
    }

    /// Open and add each path.
    ///
    /// Returns one `(path, added)` pair per input. Duplicates and sources
    /// that fail to open or have no readable frames are not added.
    pub fn add_sources(&mut self, paths: &[PathBuf]) -> Vec<(PathBuf, bool)> {
        paths
            .iter()
            .map(|path| {
                if self.contains(path) {
                    log::warn!("{} is already loaded", path.display());
                    return (path.clone(), false);
                }
                match VideoSource::open(path, self.factory.as_ref()) {
                    Ok(source) => (path.clone(), self.insert_source(source)),
                    Err(error) => {
                        log::warn!("Rejecting {}: {error}", path.display());
                        (path.clone(), false)
                    }
                }
            })
            .collect()
    }

    /// Add an already opened source. Returns `false` for a duplicate path.
    pub fn insert_source(&mut self, source: VideoSource) -> bool {
        if self.contains(source.path()) {
            log::warn!("{} is already loaded", source.path().display());
            return false;
        }
        log::debug!("Adding source {}", source.path().display());
        self.sources.push(source);
        true
    }

    /// Remove the source at `path`, returning its former index.
    pub fn delete_source(&mut self, path: &Path) -> Option<usize> {
        let index = self.sources.iter().position(|source| source.path() == path)?;
        self.sources.remove(index);
        log::debug!("Removed source {} at index {index}", path.display());
        if self.sources.is_empty() {
            self.positions.clear();
            self.state = CoordinatorState::Empty;
        }
        Some(index)
    }

    /// Whether a source with this path is active.
    pub fn contains(&self, path: &Path) -> bool {
        self.sources.iter().any(|source| source.path() == path)
    }

    /// Execute one task.
    ///
    /// # Errors
    ///
    /// - [`FrameCompareError::InvalidSources`] when sources could not be
    ///   read. They have been evicted and the remaining sources resampled.
    /// - [`FrameCompareError::NoMatchingFrameType`] when some slot has no
    ///   match. Nothing is evicted and affected slots keep their state.
    /// - [`FrameCompareError::SourceOutOfRange`] or
    ///   [`FrameCompareError::SlotOutOfRange`] for bad offset indices.
    pub fn run(&mut self, task: Task) -> Result<(), FrameCompareError> {
        log::debug!("Running task: {task}");
        match task {
            Task::Sample => self.sample(),
            Task::Resample => {
                self.positions.clear();
                self.sample()
            }
            Task::Offset {
                direction,
                source_index,
                slot_index,
            } => self.offset(source_index, direction, Some(slot_index)),
            Task::OffsetAll {
                direction,
                source_index,
            } => self.offset(source_index, direction, None),
        }
    }

    /// Apply a parameter change without decoding anything.
    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::Seed(seed) => self.update_seed(seed),
            Setting::SampleCount(count) => self.update_sample_count(count),
            Setting::FrameType(frame_type) => {
                self.set_frame_type(frame_type);
            }
        }
    }

    /// Change the planner seed. Takes effect on the next resample.
    pub fn update_seed(&mut self, seed: u64) {
        self.options.seed = seed;
    }

    /// Change the number of shared positions. Takes effect on the next sample.
    pub fn update_sample_count(&mut self, count: usize) {
        self.options.sample_count = count;
    }

    /// Change the frame type. Returns `true` if it differs from the current one.
    pub fn set_frame_type(&mut self, frame_type: FrameType) -> bool {
        let changed = self.options.frame_type != frame_type;
        self.options.frame_type = frame_type;
        changed
    }

    /// The slot at `(source_index, slot_index)`.
    pub fn frame(&self, source_index: usize, slot_index: usize) -> Option<&FrameSlot> {
        self.sources.get(source_index)?.slot(slot_index)
    }

    /// Shared requested positions.
    pub fn frame_positions(&self) -> &[u64] {
        &self.positions
    }

    /// Active sources in insertion order.
    pub fn sources(&self) -> &[VideoSource] {
        &self.sources
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Current sampling options.
    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Copy the grid for readers on other threads.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            sources: self
                .sources
                .iter()
                .map(|source| SourceSnapshot {
                    path: source.path().to_path_buf(),
                    file_name: source.file_name().to_string(),
                    total_frames: source.total_frames(),
                    slots: source.slots().to_vec(),
                })
                .collect(),
            positions: self.positions.clone(),
            state: self.state,
            frame_type: self.options.frame_type,
        }
    }

    fn sample(&mut self) -> Result<(), FrameCompareError> {
        self.state = CoordinatorState::Sampling;
        let outcome = self.sample_until_stable(Vec::new());
        self.finish(outcome)
    }

    fn offset(
        &mut self,
        source_index: usize,
        direction: Direction,
        slot_index: Option<usize>,
    ) -> Result<(), FrameCompareError> {
        let count = self.sources.len();
        let source = self
            .sources
            .get_mut(source_index)
            .ok_or(FrameCompareError::SourceOutOfRange {
                index: source_index,
                count,
            })?;

        self.state = CoordinatorState::Sampling;
        let mut sampler = source.sampler(&self.options);
        let result = match slot_index {
            Some(slot_index) => sampler.offset(slot_index, direction),
            None => sampler.offset_all(direction),
        };

        match result {
            Err(error) if error.is_source_failure() => {
                let path = source.path().to_path_buf();
                log::warn!("Evicting {}: {error}", path.display());
                self.state = CoordinatorState::Failed;
                self.sources.remove(source_index);
                let outcome = self.sample_until_stable(vec![path]);
                self.finish(outcome)
            }
            other => {
                self.state = self.idle_state();
                other
            }
        }
    }

    /// Plan and sample until a pass completes without unreadable sources,
    /// evicting the ones that failed after each pass.
    fn sample_until_stable(&mut self, mut evicted: Vec<PathBuf>) -> BatchOutcome {
        loop {
            let Some(min_total) = self.sources.iter().map(VideoSource::total_frames).min() else {
                self.positions.clear();
                return BatchOutcome {
                    evicted,
                    unmatched: None,
                };
            };

            self.positions = planner::plan(
                &self.positions,
                min_total - 1,
                self.options.sample_count,
                self.options.seed,
            );
            log::debug!(
                "Sampling {} sources at {:?} for {}",
                self.sources.len(),
                self.positions,
                self.options.frame_type,
            );

            let results = self.sample_sources();

            let mut failed = Vec::new();
            let mut unmatched = None;
            for (source, result) in self.sources.iter().zip(results) {
                match result {
                    Ok(()) => {}
                    Err(FrameCompareError::NoMatchingFrameType { frame_type }) => {
                        log::debug!("{} has no {frame_type} frame after a requested position", source.file_name());
                        unmatched = Some(frame_type);
                    }
                    Err(error) => {
                        log::warn!("Evicting {}: {error}", source.path().display());
                        failed.push(source.path().to_path_buf());
                    }
                }
            }

            if failed.is_empty() {
                return BatchOutcome { evicted, unmatched };
            }

            self.state = CoordinatorState::Failed;
            self.sources.retain(|source| !failed.iter().any(|path| path == source.path()));
            evicted.extend(failed);
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn sample_sources(&mut self) -> Vec<Result<(), FrameCompareError>> {
        let positions = &self.positions;
        let options = &self.options;
        self.sources
            .iter_mut()
            .map(|source| source.sampler(options).sample_all(positions, options.frame_type))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn sample_sources(&mut self) -> Vec<Result<(), FrameCompareError>> {
        let positions = &self.positions;
        let options = &self.options;
        self.sources
            .par_iter_mut()
            .map(|source| source.sampler(options).sample_all(positions, options.frame_type))
            .collect()
    }

    fn finish(&mut self, outcome: BatchOutcome) -> Result<(), FrameCompareError> {
        self.state = self.idle_state();
        if !outcome.evicted.is_empty() {
            return Err(FrameCompareError::InvalidSources {
                paths: outcome.evicted,
            });
        }
        match outcome.unmatched {
            Some(frame_type) => Err(FrameCompareError::NoMatchingFrameType { frame_type }),
            None => Ok(()),
        }
    }

    fn idle_state(&self) -> CoordinatorState {
        if self.sources.is_empty() {
            CoordinatorState::Empty
        } else {
            CoordinatorState::Ready
        }
    }
}
