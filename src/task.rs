//! Task, setting and event types exchanged with the sampling worker.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use crate::frame_type::FrameType;
use crate::sampler::Direction;

/// A unit of sampling work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Plan positions against the current sources and resolve every slot.
    Sample,
    /// Discard the positions, draw new ones and resolve every slot.
    Resample,
    /// Step one slot of one source to the neighbouring match.
    Offset {
        /// Scan direction.
        direction: Direction,
        /// Index of the source in the active set.
        source_index: usize,
        /// Index of the slot in the source's row.
        slot_index: usize,
    },
    /// Step every slot of one source to the neighbouring match.
    OffsetAll {
        /// Scan direction.
        direction: Direction,
        /// Index of the source in the active set.
        source_index: usize,
    },
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Task::Sample => f.write_str("sample"),
            Task::Resample => f.write_str("resample"),
            Task::Offset {
                direction,
                source_index,
                slot_index,
            } => write!(f, "offset {direction} (source {source_index}, slot {slot_index})"),
            Task::OffsetAll {
                direction,
                source_index,
            } => write!(f, "offset all {direction} (source {source_index})"),
        }
    }
}

/// A sampling parameter change. Applying one never decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Planner seed.
    Seed(u64),
    /// Number of shared positions.
    SampleCount(usize),
    /// Frame type every slot must match.
    FrameType(FrameType),
}

/// Notifications sent by the worker while it processes tasks.
///
/// Every task produces `TaskStarted`, optionally one failure event,
/// `FramesReady` and finally `TaskFinished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerEvent {
    /// The worker picked up a task.
    TaskStarted(Task),
    /// A new grid snapshot has been published.
    FramesReady,
    /// The task has completed, successfully or not.
    TaskFinished(Task),
    /// The task failed; the message is suitable for display.
    TaskFailed(String),
    /// These sources could not be read and have been evicted.
    TaskFailedInvalidSources(Vec<PathBuf>),
}
