//! Background task runner.
//!
//! A single worker thread owns the [`SamplingCoordinator`] and executes
//! commands in submission order from an unbounded queue. After each command
//! it publishes a fresh [`GridSnapshot`], so readers never wait on decoding.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;

use crate::coordinator::{GridSnapshot, SamplingCoordinator};
use crate::error::FrameCompareError;
use crate::source::VideoSource;
use crate::task::{SamplerEvent, Setting, Task};

pub(crate) enum Command {
    Configure(Setting),
    AddSources(Vec<VideoSource>),
    RemoveSource(PathBuf),
    Run(Task),
    Stop,
}

type SharedSnapshot = Arc<RwLock<Arc<GridSnapshot>>>;

/// Handle to the worker thread.
///
/// Dropping the handle stops the worker and waits for the task in flight.
pub struct SamplingWorker {
    commands: Sender<Command>,
    events: Receiver<SamplerEvent>,
    snapshot: SharedSnapshot,
    handle: Option<JoinHandle<()>>,
}

impl SamplingWorker {
    /// Move `coordinator` onto a new worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::IoError`] if the thread cannot be spawned.
    pub fn spawn(coordinator: SamplingCoordinator) -> Result<Self, FrameCompareError> {
        let (command_sender, command_receiver) = unbounded();
        let (event_sender, event_receiver) = unbounded();
        let snapshot = Arc::new(RwLock::new(Arc::new(coordinator.snapshot())));

        let shared = Arc::clone(&snapshot);
        let handle = thread::Builder::new()
            .name("frame-compare-worker".to_string())
            .spawn(move || worker_loop(coordinator, command_receiver, event_sender, shared))?;

        Ok(Self {
            commands: command_sender,
            events: event_receiver,
            snapshot,
            handle: Some(handle),
        })
    }

    /// Queue a task.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](SamplingWorker::stop).
    pub fn run(&self, task: Task) -> Result<(), FrameCompareError> {
        self.send(Command::Run(task))
    }

    /// Queue a parameter change.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](SamplingWorker::stop).
    pub fn configure(&self, setting: Setting) -> Result<(), FrameCompareError> {
        self.send(Command::Configure(setting))
    }

    /// Queue opened sources for insertion.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](SamplingWorker::stop).
    pub fn add_sources(&self, sources: Vec<VideoSource>) -> Result<(), FrameCompareError> {
        self.send(Command::AddSources(sources))
    }

    /// Queue removal of a source. Unknown paths are ignored by the worker.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::WorkerStopped`] after [`stop`](SamplingWorker::stop).
    pub fn remove_source(&self, path: PathBuf) -> Result<(), FrameCompareError> {
        self.send(Command::RemoveSource(path))
    }

    /// Task notifications, in the order they happened.
    pub fn events(&self) -> &Receiver<SamplerEvent> {
        &self.events
    }

    /// The most recently published grid.
    pub fn snapshot(&self) -> Arc<GridSnapshot> {
        self.snapshot.read().clone()
    }

    /// Whether the worker thread is still accepting commands.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Finish queued commands, then stop the thread and wait for it.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // The worker may already be gone; joining is all that is left.
            let _ = self.commands.send(Command::Stop);
            if handle.join().is_err() {
                log::warn!("Sampling worker panicked");
            }
        }
    }

    fn send(&self, command: Command) -> Result<(), FrameCompareError> {
        if self.handle.is_none() {
            return Err(FrameCompareError::WorkerStopped);
        }
        self.commands.send(command).map_err(|_| FrameCompareError::WorkerStopped)
    }
}

impl Drop for SamplingWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    mut coordinator: SamplingCoordinator,
    commands: Receiver<Command>,
    events: Sender<SamplerEvent>,
    snapshot: SharedSnapshot,
) {
    log::debug!("Sampling worker started");

    // A disconnected event receiver is not an error: nobody is listening.
    let notify = |event: SamplerEvent| {
        let _ = events.send(event);
    };

    while let Ok(command) = commands.recv() {
        match command {
            Command::Stop => break,
            Command::Configure(setting) => coordinator.apply(setting),
            Command::AddSources(sources) => {
                for source in sources {
                    coordinator.insert_source(source);
                }
            }
            Command::RemoveSource(path) => {
                if coordinator.delete_source(&path).is_none() {
                    log::debug!("{} was not loaded; nothing to remove", path.display());
                }
            }
            Command::Run(task) => {
                notify(SamplerEvent::TaskStarted(task));
                let result = coordinator.run(task);
                *snapshot.write() = Arc::new(coordinator.snapshot());

                match result {
                    Ok(()) => {}
                    Err(FrameCompareError::InvalidSources { paths }) => {
                        notify(SamplerEvent::TaskFailedInvalidSources(paths));
                    }
                    Err(error) => {
                        log::debug!("Task {task} failed: {error}");
                        notify(SamplerEvent::TaskFailed(error.to_string()));
                    }
                }
                notify(SamplerEvent::FramesReady);
                notify(SamplerEvent::TaskFinished(task));
                continue;
            }
        }
        *snapshot.write() = Arc::new(coordinator.snapshot());
    }

    log::debug!("Sampling worker stopped");
}
