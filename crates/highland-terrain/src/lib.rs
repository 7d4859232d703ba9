//! Procedural terrain height field: seeded multi-octave noise normalised to a stable range.

mod error;
mod noise_field;

pub use error::TerrainError;
pub use noise_field::{NoiseField, TerrainParameters};
