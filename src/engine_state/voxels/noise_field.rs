//! # Noise Field
//!
//! Deterministic scalar density over world space. A voxel is solid where the
//! terrain density is strictly greater than the profile's `cutoff`, unless the
//! cave signal carves it out (absolute value strictly below `cave.threshold`).
//! Both comparisons are strict everywhere in the crate, so a sample landing
//! exactly on a threshold is air for terrain and rock for caves.
//!
//! ## Evaluation
//!
//! ```text
//! sum     = Σ octave_i(sample01) * amplitude_i
//! terrain = max(0, sum - recede) * strength - y
//! ```
//!
//! Each octave samples Perlin noise at `p * frequency * lacunarity^i`, offset
//! per octave so layers do not line up at the origin. The amplitude decays by
//! `gain` per octave and is further weighted by the octave's own value when
//! `weighted_strength` is non-zero.
//!
//! The field holds no mutable state: it is shared between the main thread and
//! the generation worker behind an `Arc` and every call is a pure function of
//! position and profile.

use cgmath::{Point3, Vector3};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::block::BlockType;

const CAVE_SEED_OFFSET: u32 = 0x5eed_0001;
const WARP_SEED_OFFSET: u32 = 0x5eed_0100;
const OCTAVE_OFFSET: f64 = 101.37;

/// Domain warp applied to sample positions before any octave is evaluated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainWarp {
    /// Sample positions are used as-is.
    #[default]
    None,
    /// Positions are displaced along each axis by an independent gradient noise.
    Gradient,
}

/// Domain warp settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpProfile {
    /// Warp algorithm.
    pub kind: DomainWarp,
    /// Maximum displacement in world units.
    pub amplitude: f64,
    /// Frequency of the displacement noise.
    pub frequency: f64,
}

impl Default for WarpProfile {
    fn default() -> Self {
        Self {
            kind: DomainWarp::None,
            amplitude: 0.0,
            frequency: 0.01,
        }
    }
}

/// Cave carving settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveProfile {
    /// Base frequency of the cave signal.
    pub frequency: f64,
    /// Number of layers in the cave signal.
    pub octaves: u32,
    /// Solid voxels with `|signal| < threshold` are carved to air. Zero disables caves.
    pub threshold: f64,
}

impl Default for CaveProfile {
    fn default() -> Self {
        Self {
            frequency: 0.045,
            octaves: 2,
            threshold: 0.06,
        }
    }
}

/// Parameters of the terrain density function, supplied once per world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseProfile {
    /// Seed shared by every generator derived from this profile.
    pub seed: u32,
    /// Frequency of the first octave.
    pub frequency: f64,
    /// Number of fractal layers.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub gain: f64,
    /// How strongly an octave's value scales the next octave's amplitude.
    pub weighted_strength: f64,
    /// Domain warp settings.
    pub warp: WarpProfile,
    /// Density threshold; solid iff density > cutoff.
    pub cutoff: f64,
    /// Vertical scale of the terrain signal, in voxels.
    pub strength: f64,
    /// Bias subtracted from the layered sum before clamping at zero.
    pub recede: f64,
    /// Cave carving settings.
    pub cave: CaveProfile,
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            seed: 1337,
            frequency: 0.015,
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.5,
            weighted_strength: 0.0,
            warp: WarpProfile::default(),
            cutoff: 0.0,
            strength: 48.0,
            recede: 0.35,
            cave: CaveProfile::default(),
        }
    }
}

impl NoiseProfile {
    /// A level world: solid for every `y < 0`, air above, no caves.
    pub fn flat() -> Self {
        Self {
            strength: 0.0,
            cutoff: 0.0,
            cave: CaveProfile {
                threshold: 0.0,
                ..CaveProfile::default()
            },
            ..Self::default()
        }
    }
}

/// The terrain density function built from a [`NoiseProfile`].
#[derive(Clone)]
pub struct NoiseField {
    profile: NoiseProfile,
    terrain: Perlin,
    cave: Perlin,
    warp: [Perlin; 3],
}

impl NoiseField {
    /// Builds the generators for a profile.
    pub fn new(profile: NoiseProfile) -> Self {
        let seed = profile.seed;
        Self {
            terrain: Perlin::new(seed),
            cave: Perlin::new(seed.wrapping_add(CAVE_SEED_OFFSET)),
            warp: [
                Perlin::new(seed.wrapping_add(WARP_SEED_OFFSET)),
                Perlin::new(seed.wrapping_add(WARP_SEED_OFFSET + 1)),
                Perlin::new(seed.wrapping_add(WARP_SEED_OFFSET + 2)),
            ],
            profile,
        }
    }

    /// The profile this field was built from.
    pub fn profile(&self) -> &NoiseProfile {
        &self.profile
    }

    /// Signed terrain density at a world position. Positive above `cutoff` is solid.
    pub fn density(&self, position: Point3<f64>) -> f64 {
        let p = self.warp(position);
        let profile = &self.profile;

        let mut sum = 0.0;
        let mut frequency = profile.frequency;
        let mut amplitude = 1.0;

        for octave in 0..profile.octaves {
            let offset = OCTAVE_OFFSET * octave as f64;
            let raw = self.terrain.get([
                p.x * frequency + offset,
                p.y * frequency + offset,
                p.z * frequency + offset,
            ]);
            let sample = ((raw + 1.0) * 0.5).clamp(0.0, 1.0);

            sum += sample * amplitude;
            amplitude *= profile.gain * lerp(1.0, sample, profile.weighted_strength);
            frequency *= profile.lacunarity;
        }

        (sum - profile.recede).max(0.0) * profile.strength - position.y
    }

    /// Signed cave signal in roughly `[-1, 1]`; tunnels follow its zero crossings.
    pub fn cave_signal(&self, position: Point3<f64>) -> f64 {
        let p = self.warp(position);
        let cave = &self.profile.cave;

        let mut sum = 0.0;
        let mut total_amplitude = 0.0;
        let mut frequency = cave.frequency;
        let mut amplitude = 1.0;

        for octave in 0..cave.octaves {
            let offset = OCTAVE_OFFSET * octave as f64;
            sum += self.cave.get([
                p.x * frequency + offset,
                p.y * frequency + offset,
                p.z * frequency + offset,
            ]) * amplitude;
            total_amplitude += amplitude;
            amplitude *= self.profile.gain;
            frequency *= self.profile.lacunarity;
        }

        if total_amplitude > 0.0 {
            sum / total_amplitude
        } else {
            1.0
        }
    }

    /// Procedural block type of the voxel whose minimum corner sits at `voxel`.
    pub fn block_at(&self, voxel: Point3<i32>) -> BlockType {
        let position = Point3::new(voxel.x as f64, voxel.y as f64, voxel.z as f64);

        if self.density(position) <= self.profile.cutoff {
            return BlockType::AIR;
        }

        if self.cave_signal(position).abs() < self.profile.cave.threshold {
            return BlockType::AIR;
        }

        BlockType::SOLID
    }

    fn warp(&self, position: Point3<f64>) -> Point3<f64> {
        let settings = &self.profile.warp;
        match settings.kind {
            DomainWarp::None => position,
            DomainWarp::Gradient => {
                let q = [
                    position.x * settings.frequency,
                    position.y * settings.frequency,
                    position.z * settings.frequency,
                ];
                position
                    + Vector3::new(
                        self.warp[0].get(q),
                        self.warp[1].get(q),
                        self.warp[2].get(q),
                    ) * settings.amplitude
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
