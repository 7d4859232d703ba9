//! Configuration for the terrain world.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and support hot-reload detection. Every section falls back to
//! its defaults when missing, so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GenerationConfig, NoiseConfig, RenderConfig, TerrainConfig,
};
pub use error::ConfigError;
