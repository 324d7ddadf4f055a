//! Benchmarks for position planning, per-source sampling and overlays.
//!
//! Run with: cargo bench
//!
//! The sampling benchmarks use the scripted decoder from the integration
//! tests. The FFmpeg benchmark requires `tests/fixtures/sample_video.mp4`
//! and is skipped when the fixture is absent.

#[path = "../tests/common/mod.rs"]
mod common;

use std::path::PathBuf;

use common::{SyntheticFactory, clip, gop};
use criterion::{BatchSize, Criterion};
use frame_compare::{
    FrameType, OverlayStyle, SamplingCoordinator, SamplingOptions, Task, VideoSource,
    annotate::annotate_frame, planner,
};
use image::RgbImage;

#[cfg(feature = "ffmpeg")]
const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn benchmark_planner(criterion: &mut Criterion) {
    criterion.bench_function("generate 100 positions", |bencher| {
        bencher.iter(|| planner::generate(42, 0, 100_000, 100));
    });

    let existing = planner::generate(42, 0, 100_000, 100);
    criterion.bench_function("reconcile 100 positions against shorter source", |bencher| {
        bencher.iter(|| planner::reconcile(&existing, 50_000, 100, 42));
    });

    criterion.bench_function("expand 100 positions to 200", |bencher| {
        bencher.iter(|| planner::expand(&existing, 200, 7));
    });
}

fn benchmark_sampling(criterion: &mut Criterion) {
    let mut factory = SyntheticFactory::new();
    factory.add("bench.mp4", gop(10_000));
    let options = SamplingOptions::new();
    let positions = planner::generate(42, 0, 9_990, 10);

    criterion.bench_function("sample 10 I frames (cold)", |bencher| {
        bencher.iter_batched(
            || VideoSource::open("bench.mp4", &factory).unwrap(),
            |mut source| {
                source
                    .sampler(&options)
                    .sample_all(&positions, FrameType::I)
                    .unwrap();
                source
            },
            BatchSize::SmallInput,
        );
    });

    criterion.bench_function("sample 10 I frames (unchanged)", |bencher| {
        let mut source = VideoSource::open("bench.mp4", &factory).unwrap();
        source
            .sampler(&options)
            .sample_all(&positions, FrameType::I)
            .unwrap();
        bencher.iter(|| {
            source
                .sampler(&options)
                .sample_all(&positions, FrameType::I)
                .unwrap();
        });
    });
}

fn benchmark_coordinator(criterion: &mut Criterion) {
    let mut factory = SyntheticFactory::new();
    let paths: Vec<PathBuf> = (0..4).map(|index| PathBuf::from(format!("source_{index}.mp4"))).collect();
    for path in &paths {
        factory.add(path.clone(), clip(5_000));
    }
    let factory = factory.into_shared();

    criterion.bench_function("sample 4 sources x 5 slots", |bencher| {
        bencher.iter_batched(
            || {
                let mut coordinator = SamplingCoordinator::new(factory.clone(), SamplingOptions::new());
                coordinator.add_sources(&paths);
                coordinator
            },
            |mut coordinator| {
                coordinator.run(Task::Sample).unwrap();
                coordinator
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_overlay(criterion: &mut Criterion) {
    let style = OverlayStyle::default();
    criterion.bench_function("annotate 1920x1080 frame", |bencher| {
        bencher.iter_batched(
            || RgbImage::new(1920, 1080),
            |mut image| {
                annotate_frame(&mut image, &style, "reference_encode.mkv", FrameType::B, 1234, 14_400);
                image
            },
            BatchSize::LargeInput,
        );
    });
}

#[cfg(feature = "ffmpeg")]
fn benchmark_ffmpeg(criterion: &mut Criterion) {
    use frame_compare::{FfmpegDecoderFactory, FfmpegLogLevel, set_ffmpeg_log_level};

    if !std::path::Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    let factory = FfmpegDecoderFactory;
    let options = SamplingOptions::new().with_frame_type(FrameType::I);
    criterion.bench_function("ffmpeg open and sample 5 I frames", |bencher| {
        bencher.iter(|| {
            let mut source = VideoSource::open(SAMPLE_VIDEO, &factory).unwrap();
            let max = source.total_frames() - 1;
            let positions = planner::generate(42, 0, max, 5);
            let _ = source.sampler(&options).sample_all(&positions, FrameType::I);
        });
    });
}

#[cfg(not(feature = "ffmpeg"))]
fn benchmark_ffmpeg(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_planner,
    benchmark_sampling,
    benchmark_coordinator,
    benchmark_overlay,
    benchmark_ffmpeg,
);
criterion::criterion_main!(benches);
