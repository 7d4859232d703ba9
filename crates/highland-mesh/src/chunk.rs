//! Terrain chunk entity: grid coordinate, retained LOD meshes, and the mesh currently displayed.

use glam::Vec3;

use crate::terrain_mesh::TerrainMesh;

/// Number of precomputed LOD meshes per chunk. Level 0 is full detail.
pub const LOD_LEVELS: usize = 6;

/// Identifies a chunk's position on the terrain grid.
///
/// A chunk at `(x, z)` covers world `[x * size, (x + 1) * size]` along X and
/// the same along Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the coordinate offset by `(dx, dz)`, saturating at the `i32` range.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// World-space origin (minimum corner) of the chunk.
    pub fn origin(self, size: u32) -> Vec3 {
        Vec3::new(
            self.x as f32 * size as f32,
            0.0,
            self.z as f32 * size as f32,
        )
    }

    /// The chunk containing a world-space position. Positions beyond the
    /// `i32` chunk range clamp to its ends.
    pub fn containing(position: Vec3, size: u32) -> Self {
        let size = size as f32;
        Self {
            x: (position.x / size).floor() as i32,
            z: (position.z / size).floor() as i32,
        }
    }

    /// Chebyshev (ring) distance in chunks.
    pub fn ring_distance(self, other: ChunkCoord) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dz = (self.z as i64 - other.z as i64).unsigned_abs();
        dx.max(dz) as u32
    }

    /// Squared Euclidean distance in chunks.
    pub fn distance_sq(self, other: ChunkCoord) -> u64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        (dx * dx + dz * dz) as u64
    }
}

/// Which mesh a chunk currently displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveMesh {
    /// The full-resolution grid the chunk was built from.
    Base,
    /// One of the retained LOD meshes.
    Lod(u8),
}

#[derive(Debug)]
enum Displayed {
    Base(TerrainMesh),
    Lod(u8),
}

/// A fully built terrain chunk.
///
/// Owns its LOD meshes exclusively. Until the first LOD swap it displays the
/// full-resolution base grid, which is not part of the retained LOD array and
/// is handed back to the caller when swapped out.
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    size: u32,
    lods: Vec<TerrainMesh>,
    displayed: Displayed,
    current_lod: u8,
}

impl TerrainChunk {
    /// Assembles a chunk from its base grid and derived LOD meshes.
    ///
    /// # Panics
    ///
    /// Panics if `lods` is empty.
    pub fn new(coord: ChunkCoord, size: u32, base: TerrainMesh, lods: Vec<TerrainMesh>) -> Self {
        assert!(!lods.is_empty(), "a chunk needs at least one LOD mesh");
        Self {
            coord,
            size,
            lods,
            displayed: Displayed::Base(base),
            current_lod: 0,
        }
    }

    /// Grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Edge length in grid cells.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// World-space position of the chunk's minimum corner.
    pub fn origin(&self) -> Vec3 {
        self.coord.origin(self.size)
    }

    /// LOD level the chunk was last switched to.
    pub fn current_lod(&self) -> u8 {
        self.current_lod
    }

    /// Number of retained LOD meshes.
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    /// The retained mesh for `level`, if any.
    pub fn lod_mesh(&self, level: u8) -> Option<&TerrainMesh> {
        self.lods.get(level as usize)
    }

    /// All retained LOD meshes, finest first.
    pub fn lods(&self) -> &[TerrainMesh] {
        &self.lods
    }

    /// The full-resolution base grid, while it is still displayed.
    pub fn base_mesh(&self) -> Option<&TerrainMesh> {
        match &self.displayed {
            Displayed::Base(mesh) => Some(mesh),
            Displayed::Lod(_) => None,
        }
    }

    /// Which mesh is displayed.
    pub fn active(&self) -> ActiveMesh {
        match self.displayed {
            Displayed::Base(_) => ActiveMesh::Base,
            Displayed::Lod(level) => ActiveMesh::Lod(level),
        }
    }

    /// The mesh currently displayed.
    pub fn active_mesh(&self) -> &TerrainMesh {
        match &self.displayed {
            Displayed::Base(mesh) => mesh,
            Displayed::Lod(level) => &self.lods[*level as usize],
        }
    }

    /// Display the retained mesh for `level`.
    ///
    /// Returns the displaced mesh when it was transient (the base grid) so the
    /// caller can release it. Retained LOD meshes are never returned.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not below [`lod_count`](Self::lod_count).
    pub fn swap_to_lod(&mut self, level: u8) -> Option<TerrainMesh> {
        assert!(
            (level as usize) < self.lods.len(),
            "LOD level {level} out of range for {} levels",
            self.lods.len()
        );
        self.current_lod = level;
        match std::mem::replace(&mut self.displayed, Displayed::Lod(level)) {
            Displayed::Base(mesh) => Some(mesh),
            Displayed::Lod(_) => None,
        }
    }
}
