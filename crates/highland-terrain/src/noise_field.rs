//! Normalised multi-octave fractal Brownian motion (fBm) height field.
//!
//! Composites octaves of Perlin noise into a height value whose range does not
//! depend on the octave count: the raw sum is divided by the total amplitude
//! and rescaled by the base amplitude before the vertical offset is applied.

use glam::Vec3;
use noise::{NoiseFn, Perlin};

use crate::error::TerrainError;

/// Configuration for the terrain height field.
///
/// One value of this struct describes a whole terrain. Every chunk samples the
/// same field, which is what makes shared chunk borders agree.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParameters {
    /// Noise seed. Only the low 32 bits reach the permutation table.
    pub seed: u64,
    /// Number of noise octaves to composite. Must be at least 1.
    pub octaves: u32,
    /// Frequency of the first octave. Each octave's frequency is
    /// `base_frequency * lacunarity^octave_index`.
    pub base_frequency: f64,
    /// Amplitude of the first octave, and the half-range of the normalised output.
    pub base_amplitude: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Extra horizontal scale applied to every sample coordinate.
    pub scale: f64,
    /// Vertical offset added to every sample.
    pub base_y: f64,
}

impl Default for TerrainParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 8,
            base_frequency: 0.006,
            base_amplitude: 120.0,
            persistence: 0.75,
            lacunarity: 1.7,
            scale: 0.3,
            base_y: 0.0,
        }
    }
}

impl TerrainParameters {
    /// Check that the parameters describe a usable height field.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.octaves == 0 {
            return Err(TerrainError::invalid("octaves", "must be at least 1"));
        }
        let positive = [
            ("base_frequency", self.base_frequency),
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
            ("scale", self.scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TerrainError::invalid(name, "must be finite and positive"));
            }
        }
        if !self.base_amplitude.is_finite() || self.base_amplitude < 0.0 {
            return Err(TerrainError::invalid(
                "base_amplitude",
                "must be finite and non-negative",
            ));
        }
        if !self.base_y.is_finite() {
            return Err(TerrainError::invalid("base_y", "must be finite"));
        }
        Ok(())
    }
}

/// Seeded 2D height field. Stateless apart from the permutation table.
pub struct NoiseField {
    noise: Perlin,
    params: TerrainParameters,
    /// Σ amplitude_i, precomputed for normalisation.
    amplitude_sum: f64,
}

impl NoiseField {
    /// Create a field from validated parameters.
    pub fn new(params: TerrainParameters) -> Result<Self, TerrainError> {
        params.validate()?;
        let noise = Perlin::new(params.seed as u32);
        let amplitude_sum = amplitude_sum(&params);
        Ok(Self {
            noise,
            params,
            amplitude_sum,
        })
    }

    /// Sample the height at world coordinate `(x, z)`.
    ///
    /// The result lies approximately in
    /// `[base_y - base_amplitude, base_y + base_amplitude]`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        self.normalised(x, z) + self.params.base_y
    }

    /// Sample a centred `width × depth` grid of heights without the vertical offset.
    ///
    /// Points are produced x-major at integer coordinates, shifted so the grid is
    /// centred on the origin: `(x - width / 2, h, z - depth / 2)`.
    pub fn noise_map(&self, width: usize, depth: usize) -> Vec<Vec3> {
        let offset_x = width as f64 / 2.0;
        let offset_z = depth as f64 / 2.0;

        let mut points = Vec::with_capacity(width * depth);
        for x in 0..width {
            for z in 0..depth {
                let h = self.normalised(x as f64, z as f64);
                points.push(Vec3::new(
                    (x as f64 - offset_x) as f32,
                    h as f32,
                    (z as f64 - offset_z) as f32,
                ));
            }
        }
        points
    }

    /// Σ amplitude_i over all octaves.
    pub fn max_amplitude(&self) -> f64 {
        self.amplitude_sum
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &TerrainParameters {
        &self.params
    }

    fn normalised(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.base_amplitude;

        for _ in 0..self.params.octaves {
            let nx = x * frequency * self.params.scale;
            let nz = z * frequency * self.params.scale;
            total += self.noise.get([nx, nz]) * amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        if self.amplitude_sum == 0.0 {
            return 0.0;
        }
        total / self.amplitude_sum * self.params.base_amplitude
    }
}

fn amplitude_sum(params: &TerrainParameters) -> f64 {
    let mut sum = 0.0;
    let mut amp = params.base_amplitude;
    for _ in 0..params.octaves {
        sum += amp;
        amp *= params.persistence;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn field(params: TerrainParameters) -> NoiseField {
        NoiseField::new(params).unwrap()
    }

    /// The same seed and coordinate always give the same height.
    #[test]
    fn test_determinism_same_seed_same_coord() {
        let params = TerrainParameters {
            seed: 42,
            ..Default::default()
        };
        let a = field(params.clone());
        let b = field(params);

        let h1 = a.sample(100.5, 200.25);
        let h2 = b.sample(100.5, 200.25);
        assert_eq!(
            h1.to_bits(),
            h2.to_bits(),
            "same seed + same coord must be bit-identical: {h1} vs {h2}"
        );
        assert_eq!(a.sample(7.0, -3.0).to_bits(), a.sample(7.0, -3.0).to_bits());
    }

    /// Changing the seed changes the terrain.
    #[test]
    fn test_different_seeds_produce_different_heights() {
        let a = field(TerrainParameters {
            seed: 1,
            ..Default::default()
        });
        let b = field(TerrainParameters {
            seed: 999,
            ..Default::default()
        });

        let differs = (0..32).any(|i| {
            let x = 37.3 + i as f64 * 17.1;
            (a.sample(x, x * 0.5) - b.sample(x, x * 0.5)).abs() > EPSILON
        });
        assert!(differs, "different seeds should produce different terrain");
    }

    /// Heights stay within `base_y ± base_amplitude`.
    #[test]
    fn test_height_within_normalised_range() {
        let params = TerrainParameters {
            seed: 3,
            base_y: 25.0,
            ..Default::default()
        };
        let f = field(params.clone());

        for x in (0..60).map(|i| i as f64 * 13.7) {
            for z in (0..60).map(|i| i as f64 * 11.3) {
                let h = f.sample(x, z);
                assert!(
                    (h - params.base_y).abs() <= params.base_amplitude + EPSILON,
                    "height {h} escapes base_y ± base_amplitude at ({x}, {z})"
                );
            }
        }
    }

    /// Normalisation keeps the output range stable when octaves are added.
    #[test]
    fn test_range_independent_of_octave_count() {
        for octaves in [1, 3, 8, 12] {
            let f = field(TerrainParameters {
                seed: 11,
                octaves,
                ..Default::default()
            });
            for i in 0..200 {
                let x = i as f64 * 9.1;
                let h = f.sample(x, x * 1.3);
                assert!(h.abs() <= 120.0 + EPSILON, "octaves={octaves}: {h}");
            }
        }
    }

    /// `base_y` shifts every sample by the same amount.
    #[test]
    fn test_base_y_offsets_every_sample() {
        let flat = field(TerrainParameters {
            seed: 5,
            ..Default::default()
        });
        let raised = field(TerrainParameters {
            seed: 5,
            base_y: 40.0,
            ..Default::default()
        });
        let d = raised.sample(321.0, 654.0) - flat.sample(321.0, 654.0);
        assert!((d - 40.0).abs() < EPSILON);
    }

    /// Neighbouring samples never jump by more than a tenth of the amplitude.
    #[test]
    fn test_smooth_gradient_no_discontinuities() {
        let f = field(TerrainParameters {
            seed: 42,
            ..Default::default()
        });
        let step = 0.05;
        let max_allowed_delta = f.params().base_amplitude * 0.1;

        for i in 0..5_000 {
            let x = i as f64 * step;
            let delta = (f.sample(x + step, 0.0) - f.sample(x, 0.0)).abs();
            assert!(
                delta < max_allowed_delta,
                "discontinuity at x={x}: delta={delta}"
            );
        }
    }

    /// The amplitude sum follows the persistence series.
    #[test]
    fn test_max_amplitude_calculation() {
        let f = field(TerrainParameters {
            base_amplitude: 1000.0,
            persistence: 0.5,
            octaves: 4,
            ..Default::default()
        });
        assert!((f.max_amplitude() - 1875.0).abs() < EPSILON);
    }

    /// A flat field sits exactly at `base_y`.
    #[test]
    fn test_zero_amplitude_returns_base_y() {
        let f = field(TerrainParameters {
            base_amplitude: 0.0,
            base_y: 3.5,
            ..Default::default()
        });
        assert!((f.sample(123.0, 456.0) - 3.5).abs() < EPSILON);
    }

    /// Noise maps are centred on the origin, x-major, without the vertical offset.
    #[test]
    fn test_noise_map_is_centred_and_ignores_base_y() {
        let f = field(TerrainParameters {
            seed: 9,
            base_y: 500.0,
            ..Default::default()
        });
        let map = f.noise_map(4, 6);
        assert_eq!(map.len(), 24);
        assert_eq!(map[0].x, -2.0);
        assert_eq!(map[0].z, -3.0);
        // x-major: the second point advances along z.
        assert_eq!(map[1].x, -2.0);
        assert_eq!(map[1].z, -2.0);
        assert_eq!(map[23].x, 1.0);
        assert_eq!(map[23].z, 2.0);
        for p in &map {
            assert!(p.y.abs() <= 120.0, "noise map must not include base_y: {}", p.y);
        }
    }

    /// Unusable parameters are reported by name.
    #[test]
    fn test_invalid_parameters_rejected() {
        let zero_octaves = TerrainParameters {
            octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            NoiseField::new(zero_octaves),
            Err(TerrainError::InvalidParameter { name: "octaves", .. })
        ));

        let bad_lacunarity = TerrainParameters {
            lacunarity: f64::NAN,
            ..Default::default()
        };
        assert!(bad_lacunarity.validate().is_err());

        let negative_amplitude = TerrainParameters {
            base_amplitude: -1.0,
            ..Default::default()
        };
        assert!(negative_amplitude.validate().is_err());
    }
}
