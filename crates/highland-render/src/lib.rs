//! Camera, view-frustum culling against bounding spheres, and terrain material state.

pub mod camera;
pub mod culling;
pub mod frustum;
pub mod material;

pub use camera::Camera;
pub use culling::{CullStats, FrustumCuller, MeshNode, Scene};
pub use frustum::{BoundingSphere, Frustum};
pub use material::{TerrainMaterial, WireframeOverlay};
