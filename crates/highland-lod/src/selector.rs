//! Distance-based LOD selection with a fixed threshold ladder.
//!
//! There is no hysteresis: a camera hovering exactly at a threshold can flip a
//! chunk between two adjacent levels on consecutive frames.

use glam::{Vec2, Vec3};
use highland_mesh::{TerrainChunk, TerrainMesh};

/// Multiples of the base distance `T` that separate LOD levels.
const LADDER: [f32; 4] = [1.0, 2.5, 4.0, 5.5];

/// Distance boundaries between LOD levels.
#[derive(Clone, Debug, PartialEq)]
pub struct LodThresholds {
    /// `thresholds[i]` is the maximum distance, inclusive, for LOD level `i`.
    /// The level after the last threshold extends to infinity.
    thresholds: Vec<f32>,
}

impl LodThresholds {
    /// The terrain ladder `T, 2.5T, 4T, 5.5T` with `T = chunk_size * lod_factor`.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size * lod_factor` is not positive.
    pub fn from_chunk_size(chunk_size: u32, lod_factor: f32) -> Self {
        let base = chunk_size as f32 * lod_factor;
        Self::custom(LADDER.iter().map(|m| m * base).collect())
    }

    /// Create custom thresholds from a list of distance boundaries.
    ///
    /// # Panics
    ///
    /// Panics if thresholds are empty, not strictly increasing, or contain
    /// non-positive values.
    pub fn custom(thresholds: Vec<f32>) -> Self {
        assert!(!thresholds.is_empty(), "must have at least one threshold");
        for (i, &t) in thresholds.iter().enumerate() {
            assert!(t > 0.0, "thresholds must be positive");
            if i > 0 {
                assert!(
                    t > thresholds[i - 1],
                    "thresholds must be strictly increasing"
                );
            }
        }
        Self { thresholds }
    }

    /// The coarsest level the ladder can select.
    pub fn max_lod(&self) -> u8 {
        self.thresholds.len() as u8
    }

    /// Return a reference to the threshold distances.
    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }
}

/// A swap performed by [`LodSelector::update`].
#[derive(Debug)]
pub struct LodChange {
    /// Level displayed before the swap.
    pub from: u8,
    /// Level displayed after the swap.
    pub to: u8,
    /// Displaced mesh that was not part of the retained LOD array. Dropping it
    /// releases its buffers.
    pub released: Option<TerrainMesh>,
}

/// Selects and applies LOD levels based on planar distance from the camera.
#[derive(Clone, Debug)]
pub struct LodSelector {
    thresholds: LodThresholds,
}

impl LodSelector {
    /// Create a new LOD selector with the given thresholds.
    pub fn new(thresholds: LodThresholds) -> Self {
        Self { thresholds }
    }

    /// Determine the LOD level for a chunk at `distance` from the camera.
    ///
    /// Returns the first level whose threshold is at least `distance`, or the
    /// ladder length past the last threshold, clamped to `level_count - 1`.
    pub fn select_lod(&self, distance: f32, level_count: usize) -> u8 {
        debug_assert!(distance >= 0.0, "distance must be non-negative");
        let level = self
            .thresholds
            .thresholds
            .iter()
            .position(|&t| distance <= t)
            .map_or(self.thresholds.max_lod(), |i| i as u8);
        let max = level_count.saturating_sub(1).min(u8::MAX as usize) as u8;
        level.min(max)
    }

    /// Re-evaluate one chunk against the camera and swap its displayed mesh
    /// if the selected level changed.
    ///
    /// Returns `None` when the chunk already displays the selected level.
    pub fn update(&self, chunk: &mut TerrainChunk, camera_position: Vec3) -> Option<LodChange> {
        let distance = planar_distance(chunk.origin(), camera_position);
        let level = self.select_lod(distance, chunk.lod_count());
        let from = chunk.current_lod();
        if level == from {
            return None;
        }
        let released = chunk.swap_to_lod(level);
        Some(LodChange {
            from,
            to: level,
            released,
        })
    }

    /// Access the underlying thresholds.
    pub fn thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }
}

/// Distance between a chunk origin and the camera, ignoring altitude.
pub fn planar_distance(chunk_origin: Vec3, camera_position: Vec3) -> f32 {
    Vec2::new(chunk_origin.x, chunk_origin.z)
        .distance(Vec2::new(camera_position.x, camera_position.z))
}
