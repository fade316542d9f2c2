//! Command-line front end.
//!
//! `annotate` runs the overlay pipeline over a directory of frame images
//! in filename order and writes the annotated copies to a timestamped
//! session directory. `snapshot` reads a single frame and prints the raw
//! game tuple. Video decoding stays outside this tool; frames come in as
//! ordinary image files.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use hooplens::pipeline::FrameOutcome;
use hooplens::{FramePipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "hooplens")]
#[command(version, about = "Scoreboard OCR and win probability overlay for basketball video")]
struct Cli {
    /// Path to the pipeline config JSON.
    #[arg(short, long, default_value = "hooplens.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate an ordered directory of frame images with the overlay.
    Annotate {
        /// Directory of frame images, processed in filename order.
        frames: PathBuf,

        /// Output directory (default: <frames>_annotated/<timestamp>).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read one frame and print the raw game state tuple.
    Snapshot {
        /// A single frame image.
        frame: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        PipelineConfig::load(&cli.config)?
    } else {
        info!("config {} not found, using defaults", cli.config.display());
        PipelineConfig::default()
    };

    match cli.command {
        Commands::Annotate { frames, output } => annotate(config, &frames, output),
        Commands::Snapshot { frame } => snapshot(config, &frame),
    }
}

fn annotate(config: PipelineConfig, frames_dir: &PathBuf, output: Option<PathBuf>) -> Result<()> {
    let mut pipeline = FramePipeline::new(config)?;

    let mut frame_paths: Vec<PathBuf> = fs::read_dir(frames_dir)
        .with_context(|| format!("failed to read frame directory {}", frames_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    if frame_paths.is_empty() {
        return Err(anyhow!("no frames found in {}", frames_dir.display()));
    }
    // Frame order is load-bearing: the consensus windows assume time moves
    // forward, so frames are taken in filename order.
    frame_paths.sort();

    let output_dir = match output {
        Some(dir) => dir,
        None => {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            frames_dir.with_file_name(format!(
                "{}_annotated",
                frames_dir.file_name().unwrap_or_default().to_string_lossy()
            ))
            .join(timestamp.to_string())
        }
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let total = frame_paths.len();
    let mut failures = 0usize;

    for path in &frame_paths {
        let mut frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("skipping unreadable frame {}: {}", path.display(), e);
                continue;
            }
        };

        if let FrameOutcome::Failure(e) = pipeline.process_frame(&mut frame) {
            failures += 1;
            warn!("frame {}: {}", path.display(), e);
        }

        let out_path = output_dir.join(path.file_name().unwrap_or_default());
        frame
            .save(&out_path)
            .with_context(|| format!("failed to save {}", out_path.display()))?;
    }

    info!(
        "annotated {} frames ({} failed reads) into {}",
        total,
        failures,
        output_dir.display()
    );
    Ok(())
}

fn snapshot(config: PipelineConfig, frame_path: &PathBuf) -> Result<()> {
    let mut pipeline = FramePipeline::new(config)?;

    let frame = image::open(frame_path)
        .with_context(|| format!("failed to open frame {}", frame_path.display()))?
        .to_rgb8();

    let snap = pipeline
        .snapshot(&frame)
        .map_err(|e| anyhow!("could not read the scoreboard: {}", e))?;

    println!(
        "score1={} score2={} time_remaining={:.1}s diff={} win_probability={}",
        snap.score1,
        snap.score2,
        snap.time_remaining_sec,
        snap.score_diff,
        snap.win_probability
            .map(|p| format!("{:.4}", p))
            .unwrap_or_else(|| "n/a".to_string()),
    );
    Ok(())
}
