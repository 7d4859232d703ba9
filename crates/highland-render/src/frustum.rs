//! View frustum and bounding spheres.
//!
//! Planes are extracted from the view-projection matrix and tested against
//! world-space bounding spheres. Only the four side planes and the far plane
//! take part in sphere tests: the side planes meet at the eye, so anything
//! behind the camera is still rejected, while geometry enclosing the eye is
//! never culled by the near plane.

use glam::{Mat4, Vec3, Vec4};
use highland_mesh::TerrainMesh;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const FAR: usize = 4;

/// Slack on plane distances so rounding in plane extraction cannot cull a
/// sphere touching a plane.
const PLANE_EPSILON: f32 = 1e-3;

/// A bounding sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere around a point set: centred on the axis-aligned bounds, with
    /// the radius reaching the farthest point. Empty input gives a
    /// zero-radius sphere at the origin.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self::new(Vec3::ZERO, 0.0);
        };
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        let center = (min + max) * 0.5;
        let radius_sq = points
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0_f32, f32::max);
        Self::new(center, radius_sq.sqrt())
    }

    /// Bounding sphere of a mesh's vertices in its local space.
    pub fn from_mesh(mesh: &TerrainMesh) -> Self {
        Self::from_points(&mesh.positions)
    }

    /// Apply an affine transform. The radius grows by the largest axis scale.
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let scale = transform
            .x_axis
            .truncate()
            .length()
            .max(transform.y_axis.truncate().length())
            .max(transform.z_axis.truncate().length());
        Self::new(transform.transform_point3(self.center), self.radius * scale)
    }

    /// Radius enlarged by the factor `1 + margin`.
    pub fn inflated(&self, margin: f32) -> Self {
        Self::new(self.center, self.radius * (1.0 + margin))
    }
}

/// A view frustum defined by inward-pointing planes extracted from the
/// view-projection matrix.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Left, right, bottom, top, far. Each `Vec4(a, b, c, d)` where `(a,b,c)`
    /// is the normalised inward normal and `d` the signed distance term.
    planes: [Vec4; 5],
}

impl Frustum {
    /// Extract frustum planes from a reverse-Z view-projection matrix
    /// (Gribb-Hartmann). With reverse-Z the far plane is clip `z >= 0`.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 5];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Signed distance from `point` to each plane, positive inside.
    fn distances(&self, point: Vec3) -> impl Iterator<Item = f32> + '_ {
        self.planes
            .iter()
            .map(move |plane| plane.truncate().dot(point) + plane.w)
    }

    /// Returns `true` if the sphere is at least partially inside the frustum.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distances(sphere.center)
            .all(|d| d >= -(sphere.radius + PLANE_EPSILON))
    }

    /// Returns `true` if `point` lies inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(&BoundingSphere::new(point, 0.0))
    }
}
