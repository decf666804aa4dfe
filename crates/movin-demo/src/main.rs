//! Headless playback driver.
//!
//! Loads an exported document, steps the animator at a fixed tick, and
//! prints per-frame poses. Handy for eyeballing a document without wiring
//! up a renderer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use movin_core::{ease, Animator};
use movin_data::Document;

#[derive(Parser)]
#[command(name = "movin")]
#[command(about = "Playback driver for Bodymovin documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a document summary without playing it
    Info {
        /// Path to the exported .json document
        document: PathBuf,
    },

    /// Step through a document and print layer poses
    Play {
        document: PathBuf,

        /// Wrap around at the last frame instead of stopping
        #[arg(long)]
        looping: bool,

        /// Seconds of playback to simulate
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,

        /// Simulation tick in seconds
        #[arg(long, default_value_t = 1.0 / 30.0)]
        tick: f32,
    },

    /// Play a document, then blend into a second one
    Blend {
        document: PathBuf,
        target: PathBuf,

        /// Blend window length in frames
        #[arg(long, default_value_t = 30.0)]
        frames: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movin=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { document } => info(&document),
        Commands::Play {
            document,
            looping,
            seconds,
            tick,
        } => play(&document, looping, seconds, tick),
        Commands::Blend {
            document,
            target,
            frames,
        } => blend(&document, &target, frames),
    }
}

fn load(path: &PathBuf) -> Result<Arc<Document>> {
    let doc = Document::from_file(path)
        .with_context(|| format!("loading document {}", path.display()))?;
    Ok(Arc::new(doc))
}

fn info(path: &PathBuf) -> Result<()> {
    let doc = load(path)?;
    println!(
        "{} - {}x{} @ {} fps, frames {}..{}",
        doc.name.as_deref().unwrap_or("(unnamed)"),
        doc.width,
        doc.height,
        doc.frame_rate,
        doc.in_frame,
        doc.total_frames,
    );
    for layer in &doc.layers {
        println!(
            "  layer {} {:?}: {} shapes, window [{}, {})",
            layer.ind,
            layer.name.as_deref().unwrap_or(""),
            layer.shapes.len(),
            layer.in_frame,
            layer.out_frame,
        );
    }
    Ok(())
}

fn print_pose(animator: &Animator) {
    let tree = animator.render_tree();
    print!("frame {:7.2}:", tree.frame);
    for layer in &tree.layers {
        let p = layer.transform.transform_point3(Vec3::ZERO);
        print!(
            " [{} at ({:.1}, {:.1}) a={:.2}]",
            layer.ind, p.x, p.y, layer.opacity
        );
    }
    println!();
}

fn play(path: &PathBuf, looping: bool, seconds: f32, tick: f32) -> Result<()> {
    let doc = load(path)?;
    let mut animator = Animator::new(doc)?;
    animator.set_loop(looping);
    animator.on_complete(|| tracing::info!("playback complete"));
    animator.play();

    let steps = (seconds / tick).ceil() as usize;
    for _ in 0..steps {
        animator.advance(tick);
        print_pose(&animator);
        if !animator.is_playing() {
            break;
        }
    }
    Ok(())
}

fn blend(path: &PathBuf, target_path: &PathBuf, frames: f32) -> Result<()> {
    let doc = load(path)?;
    let target = load(target_path)?;
    let mut animator = Animator::new(doc)?;
    animator.on_complete(|| tracing::info!("transition landed"));
    animator.play();

    let tick = 1.0 / 30.0;
    // Half a run of the source document first.
    let warmup = (animator.document().total_frames / 2.0).max(1.0) as usize;
    for _ in 0..warmup {
        animator.advance(tick);
    }
    print_pose(&animator);

    animator
        .blend_to(target, frames, ease::STRONG_IN_OUT)
        .context("documents are not blend compatible")?;
    tracing::info!(frames, "blending");

    while animator.is_blending() {
        animator.advance(tick);
        print_pose(&animator);
    }
    Ok(())
}
