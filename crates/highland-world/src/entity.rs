//! A loaded chunk as a scene object: geometry, material, overlay and visibility.

use glam::{Mat4, Vec3};
use highland_lod::{LodChange, LodFade, LodSelector};
use highland_mesh::TerrainChunk;
use highland_render::{BoundingSphere, MeshNode, TerrainMaterial, WireframeOverlay};

/// One loaded chunk in the scene.
#[derive(Debug)]
pub struct ChunkEntity {
    chunk: TerrainChunk,
    material: TerrainMaterial,
    wireframe: Option<WireframeOverlay>,
    visible: bool,
    /// Local bounding sphere of the active mesh, computed on first use.
    sphere: Option<BoundingSphere>,
}

impl ChunkEntity {
    pub fn new(chunk: TerrainChunk, material: TerrainMaterial, wireframe: bool) -> Self {
        Self {
            chunk,
            material,
            wireframe: wireframe.then(|| WireframeOverlay { visible: true }),
            visible: true,
            sphere: None,
        }
    }

    pub fn chunk(&self) -> &TerrainChunk {
        &self.chunk
    }

    pub fn material(&self) -> &TerrainMaterial {
        &self.material
    }

    pub fn wireframe(&self) -> Option<&WireframeOverlay> {
        self.wireframe.as_ref()
    }

    /// World-space position of the chunk's minimum corner.
    pub fn position(&self) -> Vec3 {
        self.chunk.origin()
    }

    /// Re-select the LOD level and refresh the fade alpha.
    ///
    /// The displaced transient mesh, if any, is returned inside the change
    /// so the caller decides when it is dropped.
    pub(crate) fn apply_lod(
        &mut self,
        selector: &LodSelector,
        fade: &LodFade,
        camera_position: Vec3,
    ) -> Option<LodChange> {
        let change = selector.update(&mut self.chunk, camera_position);
        if change.is_some() {
            self.sphere = None;
        }
        let alpha = fade.alpha_for(self.chunk.current_lod(), self.chunk.lod_count());
        self.material.set_alpha(alpha);
        change
    }

    /// Release GPU-side state ahead of unloading.
    pub(crate) fn dispose(&mut self) {
        self.material.dispose();
    }
}

impl MeshNode for ChunkEntity {
    fn local_bounding_sphere(&mut self) -> BoundingSphere {
        *self
            .sphere
            .get_or_insert_with(|| BoundingSphere::from_mesh(self.chunk.active_mesh()))
    }

    fn world_transform(&self) -> Mat4 {
        Mat4::from_translation(self.chunk.origin())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        if let Some(overlay) = &mut self.wireframe {
            overlay.visible = visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use highland_lod::LodThresholds;
    use highland_mesh::{ActiveMesh, ChunkCoord, build_chunk};
    use highland_terrain::{NoiseField, TerrainParameters};

    fn entity(wireframe: bool) -> ChunkEntity {
        let field = NoiseField::new(TerrainParameters {
            seed: 3,
            octaves: 4,
            ..Default::default()
        })
        .unwrap();
        let chunk = build_chunk(&field, ChunkCoord::new(1, 2), 16);
        ChunkEntity::new(chunk, TerrainMaterial::new(-50.0, 150.0), wireframe)
    }

    #[test]
    fn test_new_entity_is_visible_at_chunk_origin() {
        let e = entity(false);
        assert!(e.is_visible());
        assert!(e.wireframe().is_none());
        assert_eq!(e.position(), Vec3::new(16.0, 0.0, 32.0));
        assert_eq!(e.world_transform().transform_point3(Vec3::ZERO), e.position());
    }

    /// The cached sphere follows the displayed mesh across a swap.
    #[test]
    fn test_sphere_cache_invalidated_on_swap() {
        let mut e = entity(false);
        let base_sphere = e.local_bounding_sphere();
        assert_eq!(e.local_bounding_sphere(), base_sphere);

        let selector = LodSelector::new(LodThresholds::from_chunk_size(16, 1.5));
        let far = e.position() + Vec3::new(1_000.0, 0.0, 0.0);
        let change = e.apply_lod(&selector, &LodFade::default(), far);
        assert!(change.is_some_and(|c| c.released.is_some()));
        assert_eq!(e.chunk().active(), ActiveMesh::Lod(4));

        let lod_sphere = e.local_bounding_sphere();
        assert_eq!(
            lod_sphere,
            BoundingSphere::from_mesh(e.chunk().active_mesh())
        );
    }

    #[test]
    fn test_apply_lod_sets_fade_alpha() {
        let mut e = entity(false);
        let selector = LodSelector::new(LodThresholds::from_chunk_size(16, 1.5));
        e.apply_lod(&selector, &LodFade::default(), e.position());
        assert_eq!(e.material().alpha(), 1.0);
        assert!(!e.material().is_transparent());

        e.apply_lod(&selector, &LodFade::default(), e.position() + Vec3::new(0.0, 0.0, 72.0));
        assert_eq!(e.chunk().current_lod(), 2);
        assert!((e.material().alpha() - 0.72).abs() < 1e-6);
        assert!(e.material().is_transparent());
    }

    #[test]
    fn test_overlay_follows_visibility() {
        let mut e = entity(true);
        e.set_visible(false);
        e.set_overlay_visible(false);
        assert_eq!(e.wireframe(), Some(&WireframeOverlay { visible: false }));
    }

    #[test]
    fn test_dispose_releases_material() {
        let mut e = entity(false);
        e.dispose();
        assert!(e.material().is_disposed());
    }
}
