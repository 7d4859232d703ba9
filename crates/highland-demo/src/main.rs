//! Headless terrain fly-over.
//!
//! Streams chunks around a camera flying over the terrain and logs streaming,
//! LOD and culling statistics as it goes.

mod flight;
mod reload;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use glam::Vec3;
use highland_config::{CliArgs, Config};
use highland_world::{FrameStats, TerrainWorld, camera_from_config};
use tracing::{error, info};

use crate::flight::FlyOver;
use crate::reload::ConfigWatcher;

/// Log statistics and check `config.ron` for edits every this many frames.
const REPORT_INTERVAL: u64 = 60;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("highland")
    });

    // Load or create config, then apply CLI overrides
    let on_disk = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    highland_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let watcher = ConfigWatcher::new(&config_dir, on_disk);
    match run(&config, &args, watcher) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("terrain demo failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    config: &Config,
    args: &CliArgs,
    mut watcher: ConfigWatcher,
) -> Result<(), highland_world::WorldError> {
    let frames = args.frames;
    let mut world = TerrainWorld::from_config(config)?;
    info!(
        seed = world.seed(),
        chunk_size = world.chunk_size(),
        view_radius = world.view_radius(),
        async_build = world.is_async(),
        "starting fly-over for {frames} frames"
    );

    let flight = FlyOver::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.6), 2.0);
    let mut camera = camera_from_config(config, Vec3::ZERO);
    let started = Instant::now();
    let mut totals = FrameStats::default();

    for frame in 0..frames {
        flight.place(&mut camera, &world, frame);
        let stats = world.frame(&camera);
        totals.streaming.integrated += stats.streaming.integrated;
        totals.streaming.unloaded += stats.streaming.unloaded;
        totals.lod_swaps += stats.lod_swaps;

        if frame % REPORT_INTERVAL == 0
            && let Some(updated) = watcher.poll(args)
        {
            // Chunks are rebuilt from scratch under the new settings.
            world = TerrainWorld::from_config(&updated)?;
            camera = camera_from_config(&updated, camera.position);
            info!(seed = world.seed(), "terrain world rebuilt");
        }

        if frame % REPORT_INTERVAL == 0 {
            info!(
                frame,
                loaded = stats.loaded,
                pending = stats.pending,
                visible = stats.cull.visible,
                culled = stats.cull.culled(),
                lod_swaps = stats.lod_swaps,
                "frame stats"
            );
        }
    }

    let elapsed = started.elapsed();
    info!(
        built = totals.streaming.integrated,
        unloaded = totals.streaming.unloaded,
        lod_swaps = totals.lod_swaps,
        released_meshes = world.released_mesh_count(),
        "fly-over finished in {:.2}s",
        elapsed.as_secs_f64()
    );
    Ok(())
}
