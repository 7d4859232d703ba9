//! Chunk mesh builder: samples the height field into a full-resolution grid and
//! derives the chunk's LOD ladder from it.

use highland_terrain::NoiseField;

use crate::chunk::{ChunkCoord, LOD_LEVELS, TerrainChunk};
use crate::lod_derivation::derive_lod_mesh;
use crate::terrain_mesh::TerrainMesh;

/// Index of grid point `(x, z)` in a `(size + 1)²` grid stored x-major.
#[inline]
pub fn grid_index(x: u32, z: u32, size: u32) -> u32 {
    x * (size + 1) + z
}

/// Fail fast on chunk sizes the grid cannot represent.
pub(crate) fn assert_grid_size(size: u32) {
    assert!(size > 0, "chunk size must be positive");
    let side = size as u64 + 1;
    assert!(
        side * side <= u32::MAX as u64,
        "chunk size {size} overflows the 32-bit index space"
    );
}

/// Build one chunk: base grid, smooth normals, and all [`LOD_LEVELS`] derived meshes.
///
/// The returned chunk is complete; nothing is built lazily afterwards.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn build_chunk(field: &NoiseField, coord: ChunkCoord, size: u32) -> TerrainChunk {
    let base = build_base_mesh(field, coord, size);
    let lods = (0..LOD_LEVELS as u8)
        .map(|level| derive_lod_mesh(&base, size, level))
        .collect();
    TerrainChunk::new(coord, size, base, lods)
}

/// Sample the full-resolution `(size + 1)²` grid for one chunk.
///
/// Vertices sit at chunk-local integer `(x, z)`; heights come from the world
/// coordinate `(coord.x * size + x, coord.z * size + z)`, so neighbouring
/// chunks produce identical heights along their shared edge.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn build_base_mesh(field: &NoiseField, coord: ChunkCoord, size: u32) -> TerrainMesh {
    assert_grid_size(size);

    let side = (size + 1) as usize;
    let cells = (size * size) as usize;
    let mut mesh = TerrainMesh::with_capacity(side * side, cells * 6);

    let world_x = coord.x as f64 * size as f64;
    let world_z = coord.z as f64 * size as f64;

    for x in 0..=size {
        for z in 0..=size {
            let height = field.sample(world_x + x as f64, world_z + z as f64);
            mesh.positions
                .push(glam::Vec3::new(x as f32, height as f32, z as f32));
        }
    }

    for x in 0..size {
        for z in 0..size {
            let a = grid_index(x, z, size);
            let b = grid_index(x + 1, z, size);
            let c = grid_index(x + 1, z + 1, size);
            let d = grid_index(x, z + 1, size);
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }

    mesh.compute_smooth_normals();
    mesh
}
