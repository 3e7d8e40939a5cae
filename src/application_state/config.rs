//! Engine configuration with defaults and JSON loading.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! values it changes. Values are validated after parsing.

use std::path::Path;

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::core::coordinates::MAX_CHUNK_VOLUME;
use crate::core::{ChunkDimensions, ConfigError};
use crate::engine_state::liquid::LiquidConfig;
use crate::engine_state::voxels::noise_field::NoiseProfile;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk layout and streaming.
    pub terrain: TerrainConfig,
    /// Density function parameters.
    pub noise: NoiseProfile,
    /// Liquid simulation constants.
    pub liquid: LiquidConfig,
}

/// Chunk layout and streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Voxels per chunk along x, y, z.
    pub chunk_dimensions: [i32; 3],
    /// Radius of the view box in chunks along x, y, z.
    pub view_distance: [i32; 3],
    /// When `false`, no new chunks are created; chunks leaving the view box still unload.
    pub generate_new_terrain: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_dimensions: [16, 16, 16],
            view_distance: [3, 2, 3],
            generate_new_terrain: true,
        }
    }
}

impl TerrainConfig {
    /// Chunk dimensions as used by the store.
    pub fn dimensions(&self) -> ChunkDimensions {
        let [x, y, z] = self.chunk_dimensions;
        ChunkDimensions::new(x, y, z)
    }

    /// View distance as a vector.
    pub fn view_distance(&self) -> Vector3<i32> {
        Vector3::from(self.view_distance)
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config = Self::from_json_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Checks every value that parsing alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [x, y, z] = self.terrain.chunk_dimensions;
        if self.terrain.chunk_dimensions.iter().any(|size| *size <= 0) {
            return Err(ConfigError::InvalidValue {
                field: "terrain.chunk_dimensions",
                reason: format!("sizes must be positive, got {:?}", self.terrain.chunk_dimensions),
            });
        }
        match ChunkDimensions::checked_volume(x, y, z) {
            Some(volume) if volume <= MAX_CHUNK_VOLUME => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "terrain.chunk_dimensions",
                    reason: format!(
                        "{:?} exceeds the limit of {} voxels per chunk",
                        self.terrain.chunk_dimensions, MAX_CHUNK_VOLUME
                    ),
                });
            }
        }
        if self.terrain.view_distance.iter().any(|radius| *radius < 0) {
            return Err(ConfigError::InvalidValue {
                field: "terrain.view_distance",
                reason: format!("radii must not be negative, got {:?}", self.terrain.view_distance),
            });
        }

        let noise = &self.noise;
        if noise.octaves == 0 {
            return Err(ConfigError::InvalidValue {
                field: "noise.octaves",
                reason: "at least one octave is required".to_string(),
            });
        }
        let finite = [
            ("noise.frequency", noise.frequency),
            ("noise.lacunarity", noise.lacunarity),
            ("noise.gain", noise.gain),
            ("noise.weighted_strength", noise.weighted_strength),
            ("noise.warp.amplitude", noise.warp.amplitude),
            ("noise.warp.frequency", noise.warp.frequency),
            ("noise.cutoff", noise.cutoff),
            ("noise.strength", noise.strength),
            ("noise.recede", noise.recede),
            ("noise.cave.frequency", noise.cave.frequency),
            ("noise.cave.threshold", noise.cave.threshold),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be finite, got {}", value),
                });
            }
        }

        self.liquid.validate()
    }
}
