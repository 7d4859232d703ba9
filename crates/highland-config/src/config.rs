//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest chunk size whose `(size + 1)²` vertex grid still fits 32-bit indices.
const MAX_CHUNK_SIZE: u32 = 65_534;

/// Largest view radius in chunks. The loaded square holds `(2r + 1)²` chunks.
const MAX_VIEW_RADIUS: u32 = 1024;

/// Multiplier of the last rung of the LOD distance ladder.
const LAST_LOD_RUNG: f32 = 5.5;

/// Top-level terrain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World layout and LOD distance settings.
    pub terrain: TerrainConfig,
    /// Height field shape.
    pub noise: NoiseConfig,
    /// Material, fade, culling and camera settings.
    pub render: RenderConfig,
    /// Background chunk building.
    pub generation: GenerationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Noise seed. `None` picks a random seed once at startup.
    pub seed: Option<u64>,
    /// Chunk edge length in grid cells.
    pub chunk_size: u32,
    /// Chunks kept loaded around the camera, per axis.
    pub view_radius: u32,
    /// Multiplier on the chunk size giving the first LOD distance.
    pub lod_factor: f32,
}

/// Height field configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    pub base_frequency: f64,
    pub base_amplitude: f64,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub scale: f64,
    /// Vertical offset added to every height.
    pub base_y: f64,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Bottom of the terrain material's height colour ramp.
    pub min_height: f32,
    /// Top of the terrain material's height colour ramp.
    pub max_height: f32,
    /// Alpha at the coarsest LOD level.
    pub min_alpha: f32,
    /// Alpha at full detail.
    pub max_alpha: f32,
    /// Bounding sphere inflation used by frustum culling.
    pub cull_margin: f32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Width / height.
    pub aspect_ratio: f32,
}

/// Background chunk building configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Worker threads (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Maximum chunks queued or building at once.
    pub max_in_flight: usize,
    /// Finished chunks buffered before workers block.
    pub result_capacity: usize,
    /// Build chunks on worker threads instead of the frame loop.
    pub async_build: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Attach a wireframe overlay to every chunk.
    pub wireframe_mode: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: None,
            chunk_size: 64,
            view_radius: 6,
            lod_factor: 1.5,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            base_frequency: 0.006,
            base_amplitude: 120.0,
            octaves: 8,
            persistence: 0.75,
            lacunarity: 1.7,
            scale: 0.3,
            base_y: 0.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_height: -50.0,
            max_height: 150.0,
            min_alpha: 0.3,
            max_alpha: 1.0,
            cull_margin: 0.2,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 5000.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            max_in_flight: 64,
            result_capacity: 128,
            async_build: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            wireframe_mode: false,
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and positive, got {value}")))
    }
}

impl Config {
    /// Check the settings the terrain world relies on.
    ///
    /// Height field parameters are checked when the field is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        if t.chunk_size == 0 || t.chunk_size > MAX_CHUNK_SIZE {
            return Err(invalid(
                "terrain.chunk_size",
                format!("must be in 1..={MAX_CHUNK_SIZE}, got {}", t.chunk_size),
            ));
        }
        if t.view_radius > MAX_VIEW_RADIUS {
            return Err(invalid(
                "terrain.view_radius",
                format!("must be at most {MAX_VIEW_RADIUS}, got {}", t.view_radius),
            ));
        }
        positive("terrain.lod_factor", t.lod_factor)?;
        let farthest = t.chunk_size as f32 * t.lod_factor * LAST_LOD_RUNG;
        if !farthest.is_finite() {
            return Err(invalid(
                "terrain.lod_factor",
                format!("LOD distances overflow for chunk size {}", t.chunk_size),
            ));
        }

        let r = &self.render;
        if !(0.0..=1.0).contains(&r.min_alpha)
            || !(0.0..=1.0).contains(&r.max_alpha)
            || r.min_alpha > r.max_alpha
        {
            return Err(invalid(
                "render.min_alpha",
                format!(
                    "alpha bounds must satisfy 0 <= min <= max <= 1, got {}..{}",
                    r.min_alpha, r.max_alpha
                ),
            ));
        }
        if !(r.cull_margin.is_finite() && r.cull_margin >= 0.0) {
            return Err(invalid("render.cull_margin", "must be finite and non-negative"));
        }
        positive("render.fov_y_degrees", r.fov_y_degrees)?;
        if r.fov_y_degrees >= 180.0 {
            return Err(invalid("render.fov_y_degrees", "must be below 180"));
        }
        positive("render.aspect_ratio", r.aspect_ratio)?;
        positive("render.near", r.near)?;
        if !(r.far.is_finite() && r.far > r.near) {
            return Err(invalid("render.far", "must be finite and beyond the near plane"));
        }

        let g = &self.generation;
        if g.max_in_flight == 0 {
            return Err(invalid("generation.max_in_flight", "must be at least 1"));
        }
        if g.result_capacity == 0 {
            return Err(invalid("generation.result_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("chunk_size: 64"));
        assert!(ron_str.contains("octaves: 8"));
        assert!(ron_str.contains("seed: None"));
    }

    #[test]
    fn test_defaults_match_terrain_shape() {
        let config = Config::default();
        assert_eq!(config.noise.base_frequency, 0.006);
        assert_eq!(config.noise.base_amplitude, 120.0);
        assert_eq!(config.noise.persistence, 0.75);
        assert_eq!(config.noise.lacunarity, 1.7);
        assert_eq!(config.noise.scale, 0.3);
        assert_eq!(config.render.cull_margin, 0.2);
        assert_eq!((config.render.min_height, config.render.max_height), (-50.0, 150.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.terrain.seed = Some(1234);
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(terrain: (chunk_size: 32), render: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.terrain.chunk_size, 32);
        assert_eq!(config.terrain.view_radius, 6);
        assert_eq!(config.noise, NoiseConfig::default());
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.terrain.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "terrain.chunk_size", .. })
        ));

        let mut config = Config::default();
        config.render.min_alpha = 0.9;
        config.render.max_alpha = 0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.far = 0.05;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "render.far", .. })
        ));

        let mut config = Config::default();
        config.terrain.lod_factor = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.cull_margin = -0.1;
        assert!(config.validate().is_err());
    }

    /// A finite factor whose ladder still overflows f32 is rejected up front.
    #[test]
    fn test_validate_rejects_overflowing_lod_distances() {
        let mut config = Config::default();
        config.terrain.lod_factor = 1e38;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "terrain.lod_factor", .. })
        ));

        config.terrain.lod_factor = 1e30;
        assert!(config.validate().is_ok());
    }

    /// View radii past the cap, including ones that would wrap as `i32`, are rejected.
    #[test]
    fn test_validate_caps_view_radius() {
        let mut config = Config::default();
        config.terrain.view_radius = MAX_VIEW_RADIUS;
        assert!(config.validate().is_ok());

        for radius in [MAX_VIEW_RADIUS + 1, 50_000, 3_000_000_000] {
            config.terrain.view_radius = radius;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { field: "terrain.view_radius", .. })
            ));
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.seed = Some(77);
        config.terrain.view_radius = 3;
        config.debug.wireframe_mode = true;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let created = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(created, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.terrain.lod_factor = 2.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.terrain.lod_factor), Some(2.0));
        assert!(modified.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// terrain settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
