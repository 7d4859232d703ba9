//! World construction errors.

use highland_config::ConfigError;
use highland_terrain::TerrainError;

/// Errors raised while building a world from configuration.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The noise settings do not describe a usable height field.
    #[error("invalid terrain parameters: {0}")]
    Terrain(#[from] TerrainError),
}
