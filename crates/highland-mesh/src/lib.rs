//! Terrain chunk meshing: full-resolution height grids, derived LOD meshes, and the async build pool.

pub mod async_build;
pub mod builder;
pub mod chunk;
pub mod lod_derivation;
pub mod terrain_mesh;

pub use async_build::{AsyncChunkBuilder, BuiltChunk, default_thread_count};
pub use builder::{build_base_mesh, build_chunk, grid_index};
pub use chunk::{ActiveMesh, ChunkCoord, LOD_LEVELS, TerrainChunk};
pub use lod_derivation::{derive_lod_mesh, is_retained, lod_step};
pub use terrain_mesh::TerrainMesh;
