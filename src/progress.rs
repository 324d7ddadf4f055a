//! Progress reporting for sampling work.
//!
//! Sampling a grid decodes frames from every source, which can take a while
//! on long GOPs. Attach a [`ProgressCallback`] through
//! [`SamplingOptions::with_progress`](crate::SamplingOptions::with_progress)
//! to observe it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frame_compare::{ProgressCallback, ProgressInfo, SamplingOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {} {pct:.1}%", info.operation, info.source);
//!         }
//!     }
//! }
//!
//! let options = SamplingOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Resolving every slot of a source against the shared positions.
    Sampling,
    /// Stepping one or more slots to the neighbouring matching frame.
    Offsetting,
}

/// A snapshot of sampling progress for one source.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// File name of the source being worked on.
    pub source: String,
    /// Slots completed so far.
    pub current: u64,
    /// Total expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 to 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Frames decoded so far, across all slots.
    pub frames_decoded: u64,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`]: callbacks fire on the
/// sampling worker thread, and on rayon threads with the `rayon` feature.
pub trait ProgressCallback: Send + Sync {
    /// Called after each unit of work.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one operation on one source and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    source: String,
    total: Option<u64>,
    current: u64,
    frames_decoded: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        source: impl Into<String>,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            source: source.into(),
            total,
            current: 0,
            frames_decoded: 0,
            start_time: Instant::now(),
        }
    }

    /// Count decoded frames without emitting a report.
    pub(crate) fn record_decoded(&mut self, frames: u64) {
        self.frames_decoded += frames;
    }

    /// Record one completed unit and report.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.report();
    }

    fn report(&self) {
        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let info = ProgressInfo {
            operation: self.operation,
            source: self.source.clone(),
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            frames_decoded: self.frames_decoded,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{OperationType, ProgressCallback, ProgressInfo, ProgressTracker};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressInfo>>);

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn tracker_reports_percentage_and_decode_count() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker =
            ProgressTracker::new(recorder.clone(), OperationType::Sampling, "a.mp4", Some(4));

        tracker.record_decoded(3);
        tracker.advance();
        tracker.record_decoded(2);
        tracker.advance();

        let reports = recorder.0.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].percentage, Some(25.0));
        assert_eq!(reports[1].current, 2);
        assert_eq!(reports[1].frames_decoded, 5);
        assert_eq!(reports[1].source, "a.mp4");
    }
}
