//! Terrain material state: named shader uniforms and GPU resource lifetime.

use std::collections::BTreeMap;

/// Uniform holding the lowest height of the colour ramp.
pub const MIN_HEIGHT: &str = "minHeight";
/// Uniform holding the highest height of the colour ramp.
pub const MAX_HEIGHT: &str = "maxHeight";
/// Uniform holding the chunk's LOD fade alpha.
pub const ALPHA: &str = "uAlpha";

/// Per-chunk terrain material.
///
/// Holds the numeric uniforms the terrain shader reads. Once disposed, the
/// GPU-side state is considered released and uniform writes are ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMaterial {
    uniforms: BTreeMap<&'static str, f32>,
    transparent: bool,
    disposed: bool,
}

impl TerrainMaterial {
    /// Create a material with the height ramp set and full opacity.
    pub fn new(min_height: f32, max_height: f32) -> Self {
        let mut uniforms = BTreeMap::new();
        uniforms.insert(MIN_HEIGHT, min_height);
        uniforms.insert(MAX_HEIGHT, max_height);
        uniforms.insert(ALPHA, 1.0);
        Self {
            uniforms,
            transparent: false,
            disposed: false,
        }
    }

    /// Set a named uniform, creating it if absent.
    pub fn set_uniform(&mut self, name: &'static str, value: f32) {
        if self.disposed {
            log::warn!("ignoring write to uniform {name} on a disposed material");
            return;
        }
        self.uniforms.insert(name, value);
    }

    pub fn uniform(&self, name: &str) -> Option<f32> {
        self.uniforms.get(name).copied()
    }

    /// Set the fade alpha. The material turns transparent below 1.
    pub fn set_alpha(&mut self, alpha: f32) {
        if self.disposed {
            return;
        }
        self.set_uniform(ALPHA, alpha);
        self.transparent = alpha < 1.0;
    }

    pub fn alpha(&self) -> f32 {
        self.uniform(ALPHA).unwrap_or(1.0)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Release GPU-side state. Idempotent.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Debug wireframe drawn over a chunk. Its visibility mirrors the chunk's.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WireframeOverlay {
    pub visible: bool,
}
