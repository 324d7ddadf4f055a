use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use frame_compare::{
    ComparisonSession, DEFAULT_SAMPLE_COUNT, DEFAULT_SEED, FfmpegLogLevel, FrameType, GridSnapshot,
    ProgressCallback, ProgressInfo, SamplerEvent, SamplingOptions, planner,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  frame-compare sample reference.mkv encode.mkv --samples 8 --seed 7\n  frame-compare sample a.mp4 b.mp4 --frame-type i --json\n  frame-compare positions --max-position 1439 --samples 5\n  frame-compare completions zsh > _frame-compare";

#[derive(Debug, Parser)]
#[command(
    name = "frame-compare",
    version,
    about = "Sample the same frames across several videos for side-by-side comparison",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample frames from every file and print where each slot landed.
    #[command(
        about = "Sample matching frames across videos",
        after_help = "Examples:\n  frame-compare sample a.mkv b.mkv\n  frame-compare sample a.mkv b.mkv --frame-type p --samples 10 --progress"
    )]
    Sample {
        /// Video files to compare.
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Number of shared positions.
        #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        samples: usize,
        /// Planner seed.
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Frame type to match (b, i, p, unknown).
        #[arg(long, default_value = "B-Type")]
        frame_type: FrameType,
        /// Output the grid as machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Show a spinner while sampling.
        #[arg(long)]
        progress: bool,
    },

    /// Print the positions the planner draws, without decoding anything.
    #[command(about = "Print planned frame positions")]
    Positions {
        /// Last valid frame index of the shortest video.
        #[arg(long)]
        max_position: u64,
        /// Number of positions.
        #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        samples: usize,
        /// Planner seed.
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    FfmpegLogLevel::parse(value)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let level = match &global.log_level {
        Some(level) => parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?,
        None if global.verbose => FfmpegLogLevel::Warning,
        None => FfmpegLogLevel::Error,
    };
    frame_compare::set_ffmpeg_log_level(level);
    Ok(())
}

struct SpinnerProgress(ProgressBar);

impl ProgressCallback for SpinnerProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let total = info.total.unwrap_or_default();
        self.0.set_message(format!(
            "{} {}/{} ({} frames decoded)",
            info.source, info.current, total, info.frames_decoded
        ));
    }
}

fn print_grid(snapshot: &GridSnapshot) {
    println!(
        "{} {:?}",
        "positions".cyan().bold(),
        snapshot.positions
    );
    for source in &snapshot.sources {
        println!(
            "{} {} ({} frames)",
            "source".cyan().bold(),
            source.file_name,
            source.total_frames
        );
        for (index, slot) in source.slots.iter().enumerate() {
            println!(
                "  [{index}] {} -> {} {}",
                slot.requested_position(),
                slot.resolved_position(),
                slot.frame_type()
            );
        }
    }
}

fn grid_to_json(snapshot: &GridSnapshot, seed: u64, rejected: &[(PathBuf, String)], evicted: &[PathBuf]) -> serde_json::Value {
    json!({
        "seed": seed,
        "frame_type": snapshot.frame_type.to_string(),
        "positions": snapshot.positions,
        "sources": snapshot.sources.iter().map(|source| json!({
            "path": source.path.display().to_string(),
            "total_frames": source.total_frames,
            "slots": source.slots.iter().map(|slot| json!({
                "requested": slot.requested_position(),
                "resolved": slot.resolved_position(),
                "frame_type": slot.frame_type().to_string(),
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "rejected": rejected.iter().map(|(path, reason)| json!({
            "path": path.display().to_string(),
            "reason": reason,
        })).collect::<Vec<_>>(),
        "evicted": evicted.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
    })
}

fn warn(message: String) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Sample {
            files,
            samples,
            seed,
            frame_type,
            json,
            progress,
        } => {
            let spinner = if progress {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
                spinner.enable_steady_tick(Duration::from_millis(100));
                Some(spinner)
            } else {
                None
            };

            let mut options = SamplingOptions::new()
                .with_sample_count(samples)
                .with_seed(seed)
                .with_frame_type(frame_type);
            if let Some(spinner) = &spinner {
                options = options.with_progress(Arc::new(SpinnerProgress(spinner.clone())));
            }

            let mut session = ComparisonSession::with_ffmpeg(options)?;
            let additions = session.add_sources(&files)?;

            let mut rejected = Vec::new();
            for addition in additions {
                if let Some(error) = addition.error {
                    if !json {
                        warn(format!("skipping {}: {error}", addition.path.display()));
                    }
                    rejected.push((addition.path, error.to_string()));
                }
            }
            if session.paths().is_empty() {
                return Err("no readable video among the given files".into());
            }

            let events = session.events().clone();
            let mut evicted = Vec::new();
            for event in events.iter() {
                session.process_event(&event)?;
                match event {
                    SamplerEvent::TaskStarted(task) => {
                        if let Some(spinner) = &spinner {
                            spinner.set_message(format!("{task}..."));
                        }
                    }
                    SamplerEvent::TaskFailed(message) => {
                        if !json {
                            warn(message);
                        }
                    }
                    SamplerEvent::TaskFailedInvalidSources(paths) => {
                        for path in &paths {
                            if !json {
                                warn(format!("evicted unreadable source {}", path.display()));
                            }
                        }
                        evicted.extend(paths);
                    }
                    SamplerEvent::FramesReady => {}
                    SamplerEvent::TaskFinished(_) => break,
                }
            }

            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let snapshot = session.snapshot();
            session.stop();

            if json {
                let payload = grid_to_json(&snapshot, seed, &rejected, &evicted);
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_grid(&snapshot);
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Sampled {} source(s) at {} position(s)",
                        snapshot.sources.len(),
                        snapshot.positions.len()
                    )
                    .green()
                );
            }
        }
        Commands::Positions {
            max_position,
            samples,
            seed,
            json,
        } => {
            let positions = planner::plan(&[], max_position, samples, seed);
            if json {
                let payload = json!({
                    "seed": seed,
                    "max_position": max_position,
                    "positions": positions,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for position in positions {
                    println!("{position}");
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "frame-compare", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
