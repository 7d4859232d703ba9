//! Per-frame frustum culling over a scene of mesh nodes.
//!
//! Occlusion culling is not provided; only the view frustum decides visibility.

use glam::Mat4;

use crate::camera::Camera;
use crate::frustum::{BoundingSphere, Frustum};

/// A mesh-bearing scene object the culler can test and toggle.
pub trait MeshNode {
    /// Bounding sphere of the displayed geometry in local space.
    fn local_bounding_sphere(&mut self) -> BoundingSphere;

    /// Local-to-world transform.
    fn world_transform(&self) -> Mat4;

    /// Show or hide the node for the next draw.
    fn set_visible(&mut self, visible: bool);

    /// Whether the node will be drawn.
    fn is_visible(&self) -> bool;

    /// Mirror `visible` onto an attached debug overlay, if any.
    fn set_overlay_visible(&mut self, _visible: bool) {}
}

/// A scene graph that can visit every mesh node it holds.
pub trait Scene {
    /// Call `visitor` once for every mesh node, in no particular order.
    fn traverse(&mut self, visitor: &mut dyn FnMut(&mut dyn MeshNode));
}

/// Counts from one culling pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Nodes tested.
    pub tested: usize,
    /// Nodes left visible.
    pub visible: usize,
}

impl CullStats {
    /// Nodes hidden by the pass.
    pub fn culled(&self) -> usize {
        self.tested - self.visible
    }
}

/// Per-frame frustum culler.
///
/// Constructed once per frame from the camera's view-projection matrix,
/// then used to test every node in the scene.
pub struct FrustumCuller {
    frustum: Frustum,
}

impl FrustumCuller {
    /// Create a new culler from the camera's view-projection matrix.
    pub fn new(view_projection: &Mat4) -> Self {
        Self {
            frustum: Frustum::from_view_projection(view_projection),
        }
    }

    /// Returns `true` if the sphere, inflated by `1 + margin`, touches the frustum.
    pub fn is_visible(&self, sphere: &BoundingSphere, margin: f32) -> bool {
        self.frustum.intersects_sphere(&sphere.inflated(margin))
    }

    /// Set the visibility of every node in `scene` against `camera`'s frustum.
    ///
    /// Each node's local bounding sphere is moved to world space and inflated
    /// by `1 + margin` before the test. Overlays follow their node.
    pub fn cull(camera: &Camera, scene: &mut dyn Scene, margin: f32) -> CullStats {
        let culler = Self::new(&camera.view_projection_matrix());
        let mut stats = CullStats::default();
        scene.traverse(&mut |node: &mut dyn MeshNode| {
            let sphere = node
                .local_bounding_sphere()
                .transformed(&node.world_transform());
            let visible = culler.is_visible(&sphere, margin);
            node.set_visible(visible);
            node.set_overlay_visible(visible);
            stats.tested += 1;
            if visible {
                stats.visible += 1;
            }
        });
        log::trace!(
            "frustum cull: {} of {} nodes visible",
            stats.visible,
            stats.tested
        );
        stats
    }
}
