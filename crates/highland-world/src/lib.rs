//! Terrain world: streams chunks around the camera and drives LOD swaps and
//! frustum culling once per frame.

mod entity;
mod error;
mod world;

pub use entity::ChunkEntity;
pub use error::WorldError;
pub use world::{FrameStats, StreamStats, TerrainWorld, camera_from_config};
