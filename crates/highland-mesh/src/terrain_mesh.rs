//! Indexed triangle mesh holding positions, normals, and indices ready for upload.

use glam::Vec3;

/// The mesh output of a grid or LOD pass.
///
/// Front faces wind clockwise when viewed from +Y. Every triangle produced
/// by this crate follows that convention, so face normals of a height field
/// point upward.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    /// Vertex positions in chunk-local coordinates.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, one per position once computed.
    pub normals: Vec<Vec3>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty mesh with room for the given vertex and index counts.
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::new(),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Appends one triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Unnormalised face normal of triangle `tri`. Its length is twice the
    /// triangle's area.
    pub fn face_normal(&self, tri: usize) -> Vec3 {
        let i = tri * 3;
        let p0 = self.positions[self.indices[i] as usize];
        let p1 = self.positions[self.indices[i + 1] as usize];
        let p2 = self.positions[self.indices[i + 2] as usize];
        (p2 - p0).cross(p1 - p0)
    }

    /// Recomputes smooth per-vertex normals.
    ///
    /// Face normals are accumulated area-weighted into each corner and then
    /// normalised, so lighting is continuous across shared vertices. Vertices
    /// referenced only by zero-area triangles fall back to +Y.
    pub fn compute_smooth_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in 0..self.triangle_count() {
            let n = self.face_normal(tri);
            for &index in &self.indices[tri * 3..tri * 3 + 3] {
                normals[index as usize] += n;
            }
        }
        for n in &mut normals {
            *n = n.try_normalize().unwrap_or(Vec3::Y);
        }
        self.normals = normals;
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }

    /// Returns `true` if every index references a vertex of this mesh.
    pub fn indices_in_range(&self) -> bool {
        let count = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> TerrainMesh {
        let mut mesh = TerrainMesh::new();
        mesh.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        // (a, b, d) and (b, c, d)
        mesh.push_triangle(0, 1, 3);
        mesh.push_triangle(1, 2, 3);
        mesh
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = TerrainMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
    }

    /// The grid winding yields upward-facing normals on flat ground.
    #[test]
    fn test_flat_quad_normals_point_up() {
        let mut mesh = unit_quad();
        mesh.compute_smooth_normals();
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-6, "expected +Y, got {n}");
        }
        assert!((mesh.face_normal(0).y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shared_vertex_normal_is_averaged() {
        let mut mesh = unit_quad();
        // Raise one corner so the two triangles tilt differently.
        mesh.positions[2].y = 1.0;
        mesh.compute_smooth_normals();
        let shared = mesh.normals[1];
        assert!((shared.length() - 1.0).abs() < 1e-6);
        assert!(shared.y > 0.0);
        // Vertex 0 only touches the flat triangle.
        assert!((mesh.normals[0] - Vec3::Y).length() < 1e-6);
        assert_ne!(shared, mesh.normals[0]);
    }

    #[test]
    fn test_bounds() {
        let mut mesh = unit_quad();
        mesh.positions[2].y = -2.0;
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_indices_in_range() {
        let mut mesh = unit_quad();
        assert!(mesh.indices_in_range());
        mesh.push_triangle(0, 1, 4);
        assert!(!mesh.indices_in_range());
    }
}
