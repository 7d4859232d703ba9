//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain fly-over command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "highland", about = "Procedural terrain with LOD and frustum culling")]
pub struct CliArgs {
    /// Noise seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Chunk edge length in grid cells.
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Chunks kept loaded around the camera, per axis.
    #[arg(long)]
    pub view_radius: Option<u32>,

    /// LOD distance multiplier.
    #[arg(long)]
    pub lod_factor: Option<f32>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Attach wireframe overlays to chunks.
    #[arg(long)]
    pub wireframe: bool,

    /// Build chunks on the frame loop instead of worker threads.
    #[arg(long)]
    pub sync: bool,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.seed = Some(seed);
        }
        if let Some(size) = args.chunk_size {
            self.terrain.chunk_size = size;
        }
        if let Some(radius) = args.view_radius {
            self.terrain.view_radius = radius;
        }
        if let Some(factor) = args.lod_factor {
            self.terrain.lod_factor = factor;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.wireframe {
            self.debug.wireframe_mode = true;
        }
        if args.sync {
            self.generation.async_build = false;
        }
    }
}
