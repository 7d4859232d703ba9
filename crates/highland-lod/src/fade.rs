//! Cosmetic alpha fade for coarser LOD levels.

/// Linear alpha ramp from `max_alpha` at full detail down to `min_alpha` at
/// the coarsest level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodFade {
    pub min_alpha: f32,
    pub max_alpha: f32,
}

impl Default for LodFade {
    fn default() -> Self {
        Self {
            min_alpha: 0.3,
            max_alpha: 1.0,
        }
    }
}

impl LodFade {
    pub fn new(min_alpha: f32, max_alpha: f32) -> Self {
        Self {
            min_alpha,
            max_alpha,
        }
    }

    /// Alpha for `level` out of `level_count` levels:
    /// `max - level / (level_count - 1) * (max - min)`.
    ///
    /// A single-level ladder is always drawn at `max_alpha`.
    pub fn alpha_for(&self, level: u8, level_count: usize) -> f32 {
        if level_count <= 1 {
            return self.max_alpha;
        }
        let t = (level as f32 / (level_count - 1) as f32).min(1.0);
        self.max_alpha - t * (self.max_alpha - self.min_alpha)
    }
}
