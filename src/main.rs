//! segworld command line
//!
//! Usage:
//!   segworld check level.ron              # Validate and classify a level
//!   segworld locate level.ron 1 2 3       # Which segment contains a point
//!   segworld visible level.ron -s 0 ...   # Visible set from a viewpoint
//!   segworld sample out.ron.br            # Write a sample corridor level

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use segworld::config::{load_config, CoreConfig};
use segworld::game::{point_mask, Locator, WallDoors};
use segworld::view::{collect_render_faces, Camera, Visibility};
use segworld::world::{
    create_corridor, create_test_world, load_world_classified, save_world, ClassifyStats, World,
};
use segworld::Vec3;

#[derive(Parser)]
#[command(name = "segworld", version)]
#[command(about = "Inspect and query segment-based levels")]
struct Cli {
    /// RON file overriding tolerance and caps
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a level, validate it and print a classification summary
    Check {
        level: PathBuf,
    },
    /// Find the segment containing a point
    Locate {
        level: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        #[arg(allow_negative_numbers = true)]
        z: f32,
        /// Segment to start searching from
        #[arg(long, default_value_t = 0)]
        hint: usize,
    },
    /// Compute the visible set from a viewpoint
    Visible {
        level: PathBuf,
        /// Segment containing the viewer
        #[arg(short, long)]
        segment: usize,
        /// Viewer position
        #[arg(long, required = true, num_args = 3, allow_negative_numbers = true, value_names = ["X", "Y", "Z"])]
        pos: Vec<f32>,
        /// Yaw in degrees (0 looks down +Z)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        yaw: f32,
        /// Pitch in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pitch: f32,
        /// Horizontal field of view in degrees
        #[arg(long, default_value_t = 90.0)]
        fov: f32,
    },
    /// Write a sample level (compressed RON)
    Sample {
        out: PathBuf,
        /// Corridor length in segments; without it the small branching level is written
        #[arg(long)]
        length: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CoreConfig::default(),
    };

    match cli.command {
        Commands::Check { level } => check(&level, &config),
        Commands::Locate { level, x, y, z, hint } => locate(&level, &config, Vec3::new(x, y, z), hint),
        Commands::Visible { level, segment, pos, yaw, pitch, fov } => {
            let pos = Vec3::new(pos[0], pos[1], pos[2]);
            visible(&level, &config, segment, pos, yaw, pitch, fov)
        }
        Commands::Sample { out, length } => sample(&out, length),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load a level, classified with the config's tolerance
fn open_level(path: &Path, config: &CoreConfig) -> Result<(World, ClassifyStats)> {
    load_world_classified(path, Some(config.plane_tolerance))
        .with_context(|| format!("Failed to load level {}", path.display()))
}

fn check(path: &Path, config: &CoreConfig) -> Result<()> {
    let (world, stats) = open_level(path, config)?;

    let mut degenerate = 0;
    for segnum in 0..world.segment_count() {
        if point_mask(&world, world.segment_center(segnum), segnum) != 0 {
            degenerate += 1;
        }
    }

    println!("{}", path.display());
    println!("  segments:      {}", world.segment_count());
    println!("  vertices:      {}", world.vertices.len());
    println!("  walls:         {}", world.walls.len());
    println!("  quad sides:    {}", stats.quads);
    println!("  split sides:   {}", stats.triangulated);
    println!("  re-merged:     {}", stats.detriangulated);
    println!("  center outside own segment: {}", degenerate);
    Ok(())
}

fn locate(path: &Path, config: &CoreConfig, point: Vec3, hint: usize) -> Result<()> {
    let (world, _) = open_level(path, config)?;
    let mut locator = Locator::from_config(config);

    let found = locator.locate(&world, point, hint);
    let stats = locator.last_trace();
    match found {
        Some(segnum) if stats.scanned => println!(
            "segment {} (found by full scan; trace from {} gave up after {} segments)",
            segnum, hint, stats.calls
        ),
        Some(segnum) => {
            println!("segment {} (trace visited {}, depth {})", segnum, stats.calls, stats.max_depth)
        }
        None => println!("not found"),
    }
    Ok(())
}

fn visible(
    path: &Path,
    config: &CoreConfig,
    segment: usize,
    pos: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
) -> Result<()> {
    let (world, _) = open_level(path, config)?;
    anyhow::ensure!(
        segment < world.segment_count(),
        "segment {} out of range (level has {})", segment, world.segment_count()
    );

    let camera = Camera::looking(pos, yaw.to_radians(), pitch.to_radians(), fov.to_radians());
    let mut vis = Visibility::from_config(config);
    let doors = WallDoors::new();
    let visible = vis.update(&world, &doors, &camera.frustum(), segment).to_vec();

    let mut faces = Vec::new();
    collect_render_faces(&world, &visible, &mut faces);

    println!("visible segments ({}{}): {:?}",
        visible.len(),
        if vis.truncated() { ", capped" } else { "" },
        visible);
    println!("faces to draw: {}", faces.len());
    Ok(())
}

fn sample(out: &Path, length: Option<usize>) -> Result<()> {
    let world = match length {
        Some(n) => {
            anyhow::ensure!(n > 0, "corridor length must be at least 1");
            create_corridor(n)
        }
        None => create_test_world(),
    };
    save_world(&world, out).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("wrote {} segments to {}", world.segment_count(), out.display());
    Ok(())
}
