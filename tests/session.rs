//! Comparison session integration tests.
//!
//! Source files are empty placeholders in a temporary directory: path
//! validation only looks at the file system, and decoding is scripted.

mod common;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use common::{Controls, SyntheticFactory, clip, uniform};
use frame_compare::{
    ComparisonSession, Direction, FrameCompareError, FrameType, SamplerEvent, SamplingOptions, Task,
};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    paths: Vec<PathBuf>,
    controls: Vec<Controls>,
    session: ComparisonSession,
}

fn fixture(lengths: &[usize]) -> Fixture {
    fixture_with(lengths.iter().map(|&length| clip(length)).collect())
}

fn fixture_with(scripts: Vec<Vec<u8>>) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut factory = SyntheticFactory::new();
    let mut paths = Vec::new();
    let mut controls = Vec::new();
    for (index, tags) in scripts.into_iter().enumerate() {
        let path = dir.path().join(format!("source_{index}.mp4"));
        fs::write(&path, b"").expect("placeholder written");
        controls.push(factory.add(path.clone(), tags));
        paths.push(path);
    }
    let session = ComparisonSession::new(factory.into_shared(), SamplingOptions::new()).expect("worker spawns");
    Fixture {
        dir,
        paths,
        controls,
        session,
    }
}

/// Drain events up to and including the next `TaskFinished`.
fn wait_for_task(session: &mut ComparisonSession) -> Vec<SamplerEvent> {
    let events = session.events().clone();
    let mut seen = Vec::new();
    loop {
        let event = events
            .recv_timeout(Duration::from_secs(10))
            .expect("worker finished the task in time");
        session.process_event(&event).expect("worker running");
        let finished = matches!(event, SamplerEvent::TaskFinished(_));
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

// ── Adding sources ─────────────────────────────────────────────────

#[test]
fn added_sources_are_sampled_in_background() {
    let mut fx = fixture(&[300, 400]);
    let additions = fx.session.add_sources(&fx.paths).unwrap();
    assert!(additions.iter().all(|addition| addition.is_added()));

    let events = wait_for_task(&mut fx.session);
    assert_eq!(
        events,
        vec![
            SamplerEvent::TaskStarted(Task::Sample),
            SamplerEvent::FramesReady,
            SamplerEvent::TaskFinished(Task::Sample),
        ]
    );

    let snapshot = fx.session.snapshot();
    assert_eq!(snapshot.paths(), fx.paths);
    assert!(snapshot.sources.iter().all(|source| source.slots.len() == 5));
    assert!(snapshot.positions.iter().all(|&p| p <= 299));

    let current = fx.session.current_frame().expect("slot sampled");
    assert_eq!(current.requested_position(), snapshot.positions[0]);
}

#[test]
fn invalid_paths_are_rejected_individually() {
    let mut fx = fixture(&[100]);
    let text_file = fx.dir.path().join("notes.txt");
    fs::write(&text_file, b"").unwrap();
    let missing = fx.dir.path().join("missing.mp4");

    let additions = fx
        .session
        .add_sources([fx.paths[0].clone(), fx.paths[0].clone(), text_file, missing])
        .unwrap();

    let added: Vec<bool> = additions.iter().map(|addition| addition.is_added()).collect();
    assert_eq!(added, vec![true, false, false, false]);
    assert!(matches!(
        additions[2].error,
        Some(FrameCompareError::UnsupportedPath { .. })
    ));
    assert_eq!(fx.session.paths(), &fx.paths[..]);

    wait_for_task(&mut fx.session);

    // A second attempt is a duplicate and queues nothing.
    let additions = fx.session.add_sources(&fx.paths).unwrap();
    assert!(!additions[0].is_added());
    assert!(fx.session.events().try_recv().is_err());
}

// ── Navigation ─────────────────────────────────────────────────────

#[test]
fn cursors_wrap_around() {
    let mut fx = fixture(&[100, 100, 100]);
    fx.session.add_sources(&fx.paths).unwrap();

    fx.session.change_frame(Direction::Backward);
    assert_eq!(fx.session.current_slot(), 4);
    fx.session.change_frame(Direction::Forward);
    assert_eq!(fx.session.current_slot(), 0);

    fx.session.change_source(Direction::Backward);
    assert_eq!(fx.session.current_source(), 2);
    fx.session.change_source(Direction::Forward);
    assert_eq!(fx.session.current_source(), 0);
}

#[test]
fn deleting_sources_keeps_cursors_in_range() {
    let mut fx = fixture(&[100, 100, 100]);
    fx.session.add_sources(&fx.paths).unwrap();
    wait_for_task(&mut fx.session);

    fx.session.change_source(Direction::Backward);
    fx.session.change_frame(Direction::Forward);
    assert_eq!(fx.session.current_source(), 2);

    assert_eq!(fx.session.delete_source(&fx.paths[2]).unwrap(), Some(2));
    assert_eq!(fx.session.current_source(), 1);
    assert_eq!(fx.session.current_slot(), 1);

    assert_eq!(fx.session.delete_source(&fx.paths[2]).unwrap(), None);
    fx.session.delete_source(&fx.paths[0]).unwrap();
    fx.session.delete_source(&fx.paths[1]).unwrap();
    assert!(fx.session.paths().is_empty());
    assert_eq!(fx.session.current_source(), 0);
    assert_eq!(fx.session.current_slot(), 0);
}

// ── Tasks ──────────────────────────────────────────────────────────

#[test]
fn evicted_sources_leave_the_session() {
    let mut fx = fixture(&[200, 200]);
    fx.session.add_sources(&fx.paths).unwrap();
    wait_for_task(&mut fx.session);

    // Same seed would redraw the same positions and reuse every slot.
    fx.controls[0].break_source();
    fx.session.update_seed(7).unwrap();
    fx.session.resample().unwrap();
    let events = wait_for_task(&mut fx.session);

    assert!(events.contains(&SamplerEvent::TaskFailedInvalidSources(vec![fx.paths[0].clone()])));
    assert_eq!(fx.session.paths(), &fx.paths[1..]);
    assert_eq!(fx.session.snapshot().paths(), &fx.paths[1..]);
}

#[test]
fn frame_type_change_resamples() {
    let mut fx = fixture_with(vec![uniform(500, b'P')]);
    fx.session.add_sources(&fx.paths).unwrap();
    let events = wait_for_task(&mut fx.session);
    assert!(events.iter().any(|event| matches!(event, SamplerEvent::TaskFailed(_))));
    assert!(fx.session.current_frame().is_none());

    assert!(!fx.session.set_frame_type(FrameType::B).unwrap());
    assert!(fx.session.set_frame_type(FrameType::P).unwrap());
    let events = wait_for_task(&mut fx.session);
    assert_eq!(
        events,
        vec![
            SamplerEvent::TaskStarted(Task::Resample),
            SamplerEvent::FramesReady,
            SamplerEvent::TaskFinished(Task::Resample),
        ]
    );

    let snapshot = fx.session.snapshot();
    assert_eq!(snapshot.frame_type, FrameType::P);
    assert!(snapshot.sources[0].slots.iter().all(|slot| slot.frame_type() == FrameType::P));
}

#[test]
fn offset_current_frame_moves_forward() {
    let mut fx = fixture(&[500]);
    fx.session.add_sources(&fx.paths).unwrap();
    wait_for_task(&mut fx.session);

    let before = fx.session.current_frame().unwrap().resolved_position();
    fx.session.offset_current_frame(Direction::Forward).unwrap();
    wait_for_task(&mut fx.session);

    let after = fx.session.current_frame().unwrap();
    assert!(after.resolved_position() > before);
    assert_eq!(after.requested_position(), before + 1);
}

#[test]
fn stopped_session_rejects_work() {
    let mut fx = fixture(&[100]);
    fx.session.stop();
    assert!(matches!(fx.session.resample(), Err(FrameCompareError::WorkerStopped)));
    assert!(matches!(
        fx.session.add_sources(&fx.paths),
        Err(FrameCompareError::WorkerStopped)
    ));
}
