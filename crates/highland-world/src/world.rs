//! Chunk streaming and the per-frame LOD and culling driver.
//!
//! Each frame the world keeps a square of chunks around the camera loaded,
//! swaps every loaded chunk to the LOD level its distance calls for, and
//! toggles chunk visibility against the camera frustum.

use std::sync::Arc;

use glam::Vec3;
use highland_config::Config;
use highland_lod::{LodFade, LodSelector, LodThresholds};
use highland_mesh::{AsyncChunkBuilder, ChunkCoord, TerrainChunk, build_chunk, default_thread_count};
use highland_render::{Camera, CullStats, FrustumCuller, MeshNode, Scene, TerrainMaterial};
use highland_terrain::{NoiseField, TerrainParameters};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::entity::ChunkEntity;
use crate::error::WorldError;

/// What one streaming pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Chunks queued for background building.
    pub submitted: usize,
    /// Chunks built and inserted this pass.
    pub integrated: usize,
    /// Pending builds cancelled because they left the view range.
    pub cancelled: usize,
    /// Loaded chunks removed because they left the view range.
    pub unloaded: usize,
}

/// Per-frame statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub streaming: StreamStats,
    /// Chunks that changed LOD level.
    pub lod_swaps: usize,
    pub cull: CullStats,
    /// Chunks loaded after the frame.
    pub loaded: usize,
    /// Chunks still building after the frame.
    pub pending: usize,
}

/// Build the camera described by the render settings.
pub fn camera_from_config(config: &Config, position: Vec3) -> Camera {
    let r = &config.render;
    Camera::new(
        position,
        r.fov_y_degrees.to_radians(),
        r.aspect_ratio,
        r.near,
        r.far,
    )
}

/// The streamed terrain.
///
/// Owns every loaded chunk. Only fully built chunks are ever inserted.
pub struct TerrainWorld {
    field: Arc<NoiseField>,
    chunk_size: u32,
    view_radius: u32,
    selector: LodSelector,
    fade: LodFade,
    cull_margin: f32,
    min_height: f32,
    max_height: f32,
    wireframe: bool,
    /// `None` builds chunks synchronously on the calling thread.
    builder: Option<AsyncChunkBuilder>,
    chunks: FxHashMap<ChunkCoord, ChunkEntity>,
    pending: FxHashSet<ChunkCoord>,
    released_meshes: u64,
}

impl TerrainWorld {
    /// Build a world from validated configuration.
    ///
    /// The height field is created once here and shared by every chunk. An
    /// unset seed is drawn at random.
    pub fn from_config(config: &Config) -> Result<Self, WorldError> {
        config.validate()?;

        let seed = config.terrain.seed.unwrap_or_else(rand::random);
        let n = &config.noise;
        let field = Arc::new(NoiseField::new(TerrainParameters {
            seed,
            octaves: n.octaves,
            base_frequency: n.base_frequency,
            base_amplitude: n.base_amplitude,
            persistence: n.persistence,
            lacunarity: n.lacunarity,
            scale: n.scale,
            base_y: n.base_y,
        })?);

        let chunk_size = config.terrain.chunk_size;
        let g = &config.generation;
        let builder = g.async_build.then(|| {
            let threads = match g.worker_threads {
                0 => default_thread_count(),
                n => n,
            };
            AsyncChunkBuilder::new(
                Arc::clone(&field),
                chunk_size,
                threads,
                g.max_in_flight,
                g.result_capacity,
            )
        });

        let r = &config.render;
        tracing::info!(
            seed,
            chunk_size,
            view_radius = config.terrain.view_radius,
            async_build = builder.is_some(),
            "terrain world created"
        );

        Ok(Self {
            field,
            chunk_size,
            view_radius: config.terrain.view_radius,
            selector: LodSelector::new(LodThresholds::from_chunk_size(
                chunk_size,
                config.terrain.lod_factor,
            )),
            fade: LodFade::new(r.min_alpha, r.max_alpha),
            cull_margin: r.cull_margin,
            min_height: r.min_height,
            max_height: r.max_height,
            wireframe: config.debug.wireframe_mode,
            builder,
            chunks: FxHashMap::default(),
            pending: FxHashSet::default(),
            released_meshes: 0,
        })
    }

    /// Run one frame: streaming, then LOD, then culling.
    pub fn frame(&mut self, camera: &Camera) -> FrameStats {
        let streaming = self.update_streaming(camera.position);
        let lod_swaps = self.update_lod(camera.position);
        let cull = self.cull(camera);
        FrameStats {
            streaming,
            lod_swaps,
            cull,
            loaded: self.chunks.len(),
            pending: self.pending.len(),
        }
    }

    /// Keep the chunks within `view_radius` of the camera's chunk loaded.
    ///
    /// Out-of-range chunks are unloaded and their pending builds cancelled,
    /// finished builds are integrated, and missing chunks are requested
    /// nearest first.
    pub fn update_streaming(&mut self, camera_position: Vec3) -> StreamStats {
        let center = ChunkCoord::containing(camera_position, self.chunk_size);
        let radius = self.view_radius;
        let in_range = |coord: ChunkCoord| coord.ring_distance(center) <= radius;
        let mut stats = StreamStats::default();

        let leaving: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|&c| !in_range(c))
            .collect();
        for coord in leaving {
            if let Some(mut entity) = self.chunks.remove(&coord) {
                entity.dispose();
                stats.unloaded += 1;
                tracing::debug!(?coord, "chunk unloaded");
            }
        }

        let finished = match &self.builder {
            Some(builder) => {
                self.pending.retain(|&coord| {
                    if in_range(coord) {
                        return true;
                    }
                    builder.cancel(&coord);
                    stats.cancelled += 1;
                    false
                });
                builder.drain_results()
            }
            None => Vec::new(),
        };
        for built in finished {
            let coord = built.chunk.coord();
            self.pending.remove(&coord);
            if !in_range(coord) || self.chunks.contains_key(&coord) {
                continue;
            }
            tracing::debug!(?coord, build_time_us = built.build_time_us, "chunk built");
            self.insert_chunk(built.chunk);
            stats.integrated += 1;
        }

        for coord in wanted_chunks(center, radius) {
            if self.chunks.contains_key(&coord) || self.pending.contains(&coord) {
                continue;
            }
            match &self.builder {
                Some(builder) => {
                    if builder.submit(coord).is_err() {
                        break;
                    }
                    self.pending.insert(coord);
                    stats.submitted += 1;
                }
                None => {
                    let chunk = build_chunk(&self.field, coord, self.chunk_size);
                    self.insert_chunk(chunk);
                    stats.integrated += 1;
                }
            }
        }
        stats
    }

    /// Swap every loaded chunk to the LOD level its distance selects and
    /// refresh its fade alpha. Returns the number of chunks that changed level.
    pub fn update_lod(&mut self, camera_position: Vec3) -> usize {
        let mut swaps = 0;
        for entity in self.chunks.values_mut() {
            let Some(change) = entity.apply_lod(&self.selector, &self.fade, camera_position)
            else {
                continue;
            };
            swaps += 1;
            if change.released.is_some() {
                self.released_meshes += 1;
            }
            tracing::trace!(
                coord = ?entity.chunk().coord(),
                from = change.from,
                to = change.to,
                "LOD swap"
            );
        }
        swaps
    }

    /// Set chunk visibility against the camera frustum.
    pub fn cull(&mut self, camera: &Camera) -> CullStats {
        let margin = self.cull_margin;
        FrustumCuller::cull(camera, self, margin)
    }

    fn insert_chunk(&mut self, chunk: TerrainChunk) {
        let material = TerrainMaterial::new(self.min_height, self.max_height);
        let coord = chunk.coord();
        self.chunks
            .insert(coord, ChunkEntity::new(chunk, material, self.wireframe));
    }

    /// The loaded chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkEntity> {
        self.chunks.get(&coord)
    }

    /// Iterate over loaded chunks in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkEntity> {
        self.chunks.values()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Transient meshes released by LOD swaps so far.
    pub fn released_mesh_count(&self) -> u64 {
        self.released_meshes
    }

    /// Height field shared by all chunks.
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    pub fn seed(&self) -> u64 {
        self.field.params().seed
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn view_radius(&self) -> u32 {
        self.view_radius
    }

    pub fn is_async(&self) -> bool {
        self.builder.is_some()
    }
}

impl Scene for TerrainWorld {
    fn traverse(&mut self, visitor: &mut dyn FnMut(&mut dyn MeshNode)) {
        for entity in self.chunks.values_mut() {
            visitor(entity);
        }
    }
}

/// Every chunk within `radius` rings of `center`, nearest first.
fn wanted_chunks(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let r = radius as i32;
    let mut coords: Vec<ChunkCoord> = (-r..=r)
        .flat_map(|dx| (-r..=r).map(move |dz| center.offset(dx, dz)))
        .collect();
    coords.sort_by_key(|&c| (c.distance_sq(center), c));
    // Offsets saturate at the edge of the coordinate range.
    coords.dedup();
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(async_build: bool) -> Config {
        let mut config = Config::default();
        config.terrain.seed = Some(42);
        config.terrain.chunk_size = 16;
        config.terrain.view_radius = 1;
        config.noise.octaves = 4;
        config.generation.async_build = async_build;
        config.generation.worker_threads = 2;
        config
    }

    #[test]
    fn test_wanted_chunks_nearest_first() {
        let center = ChunkCoord::new(5, -3);
        let wanted = wanted_chunks(center, 2);
        assert_eq!(wanted.len(), 25);
        assert_eq!(wanted[0], center);
        let dists: Vec<u64> = wanted.iter().map(|c| c.distance_sq(center)).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        assert!(wanted.iter().all(|c| c.ring_distance(center) <= 2));
    }

    #[test]
    fn test_from_config_uses_seed_and_mode() {
        let world = TerrainWorld::from_config(&small_config(false)).unwrap();
        assert_eq!(world.seed(), 42);
        assert!(!world.is_async());
        assert_eq!(world.chunk_size(), 16);
        assert_eq!(world.field().params().octaves, 4);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = small_config(false);
        config.terrain.chunk_size = 0;
        assert!(matches!(
            TerrainWorld::from_config(&config),
            Err(WorldError::Config(_))
        ));

        let mut config = small_config(false);
        config.terrain.lod_factor = 1e38;
        assert!(matches!(
            TerrainWorld::from_config(&config),
            Err(WorldError::Config(_))
        ));

        let mut config = small_config(false);
        config.noise.octaves = 0;
        assert!(matches!(
            TerrainWorld::from_config(&config),
            Err(WorldError::Terrain(_))
        ));
    }

    #[test]
    fn test_sync_streaming_loads_square() {
        let mut world = TerrainWorld::from_config(&small_config(false)).unwrap();
        let stats = world.update_streaming(Vec3::new(8.0, 100.0, 8.0));
        assert_eq!(stats.integrated, 9);
        assert_eq!(world.loaded_count(), 9);
        assert_eq!(world.pending_count(), 0);
        for dx in -1..=1 {
            for dz in -1..=1 {
                assert!(world.chunk(ChunkCoord::new(dx, dz)).is_some());
            }
        }
        let again = world.update_streaming(Vec3::new(8.0, 100.0, 8.0));
        assert_eq!(again, StreamStats::default());
    }

    #[test]
    fn test_sync_streaming_unloads_out_of_range() {
        let mut world = TerrainWorld::from_config(&small_config(false)).unwrap();
        world.update_streaming(Vec3::new(8.0, 0.0, 8.0));
        // Two chunks along +X: only the x = 1 column stays in range.
        let stats = world.update_streaming(Vec3::new(40.0, 0.0, 8.0));
        assert_eq!(stats.unloaded, 6);
        assert_eq!(stats.integrated, 6);
        assert_eq!(world.loaded_count(), 9);
        assert!(world.chunk(ChunkCoord::new(0, 0)).is_none());
        assert!(world.chunk(ChunkCoord::new(1, -1)).is_some());
        assert!(world.chunk(ChunkCoord::new(3, 1)).is_some());
    }

    #[test]
    fn test_wireframe_overlay_attached_from_config() {
        let mut config = small_config(false);
        config.debug.wireframe_mode = true;
        let mut world = TerrainWorld::from_config(&config).unwrap();
        world.update_streaming(Vec3::ZERO);
        assert!(world.chunks().all(|e| e.wireframe().is_some()));
    }
}
