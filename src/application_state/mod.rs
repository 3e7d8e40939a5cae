//! # Application State Management
//!
//! This module drives the engine without a window:
//! - Configuration loading (`config`)
//! - A fixed-timestep frame loop that moves the viewer
//! - Sample edits and water spawns standing in for player input
//!
//! Output goes to a [`LoggingRenderer`], so a full session can run headless
//! and report what a real renderer would have received.

pub mod config;

use std::time::Duration;

use cgmath::{Point3, Vector3};

use config::EngineConfig;

use crate::core::coordinates::voxel_of_world;
use crate::core::EngineError;
use crate::engine_state::rendering::LoggingRenderer;
use crate::engine_state::{EngineState, TickReport};

/// Frames between sample block edits.
const EDIT_INTERVAL_FRAMES: u64 = 30;
/// Frames between sample water spawns.
const WATER_INTERVAL_FRAMES: u64 = 45;

/// Totals for a run of frames.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Frames simulated.
    pub frames: u64,
    /// Chunks installed and uploaded.
    pub finalized: usize,
    /// Edits that were applied.
    pub edits: usize,
    /// Edits rejected because their chunk was not loaded.
    pub rejected_edits: usize,
    /// Liquid steps run.
    pub liquid_steps: usize,
}

/// The headless application: an engine, its output, and a scripted viewer.
pub struct ApplicationState {
    /// The core engine state and logic
    pub engine_state: EngineState,

    /// Receives meshes and fluid visuals
    pub renderer: LoggingRenderer,

    viewer: Point3<f32>,
    velocity: Vector3<f32>,
    rng: fastrand::Rng,
    frame: u64,
}

impl ApplicationState {
    /// Builds the engine from `config` with the viewer at `viewer`.
    ///
    /// # Arguments
    /// * `config` - Validated engine configuration
    /// * `viewer` - Initial viewer position
    /// * `seed` - Seed for the scripted edits and water spawns
    pub fn new(config: &EngineConfig, viewer: Point3<f32>, seed: u64) -> Result<Self, EngineError> {
        Ok(ApplicationState {
            engine_state: EngineState::new(config)?,
            renderer: LoggingRenderer::new(),
            viewer,
            velocity: Vector3::new(4.0, 0.0, 1.5),
            rng: fastrand::Rng::with_seed(seed),
            frame: 0,
        })
    }

    /// Current viewer position.
    pub fn viewer(&self) -> Point3<f32> {
        self.viewer
    }

    /// Sets the viewer's speed in world units per second.
    pub fn set_velocity(&mut self, velocity: Vector3<f32>) {
        self.velocity = velocity;
    }

    /// Streams in the chunks around the viewer and waits for all of them.
    ///
    /// # Returns
    /// The number of chunks installed.
    pub fn warm_up(&mut self, timeout: Duration) -> Result<usize, EngineError> {
        self.engine_state
            .tick(self.viewer, Duration::ZERO, &mut self.renderer)?;
        let installed = self
            .engine_state
            .flush_generation(&mut self.renderer, timeout)?;
        log::info!(
            "Warm-up installed {} chunks ({} quads)",
            installed,
            self.renderer.quad_count()
        );
        Ok(installed)
    }

    /// Advances one frame: moves the viewer, applies scripted actions, ticks the engine.
    pub fn run_frame(&mut self, dt: Duration, summary: &mut RunSummary) -> Result<TickReport, EngineError> {
        self.frame += 1;
        self.viewer += self.velocity * dt.as_secs_f32();

        if self.frame % EDIT_INTERVAL_FRAMES == 0 {
            self.sample_edit(summary)?;
        }
        if self.frame % WATER_INTERVAL_FRAMES == 0 {
            let amount = 0.5 + self.rng.f32() * 1.5;
            self.engine_state
                .spawn_water(voxel_of_world(self.viewer), amount);
        }

        let report = self
            .engine_state
            .tick(self.viewer, dt, &mut self.renderer)?;

        summary.frames += 1;
        if report.finalized.is_some() {
            summary.finalized += 1;
        }
        if report.liquid.is_some() {
            summary.liquid_steps += 1;
        }
        Ok(report)
    }

    /// Runs `frames` frames of `dt` each.
    pub fn run_frames(&mut self, frames: u64, dt: Duration) -> Result<RunSummary, EngineError> {
        let mut summary = RunSummary::default();
        for _ in 0..frames {
            self.run_frame(dt, &mut summary)?;
        }
        Ok(summary)
    }

    /// Digs or builds at a random spot below and around the viewer.
    fn sample_edit(&mut self, summary: &mut RunSummary) -> Result<(), EngineError> {
        let target = Point3::new(
            self.viewer.x + self.rng.i32(-8..8) as f32,
            self.viewer.y - self.rng.i32(1..6) as f32,
            self.viewer.z + self.rng.i32(-8..8) as f32,
        );

        let result = if self.rng.bool() {
            self.engine_state.destroy_block(target)
        } else {
            self.engine_state.place_block(target)
        };

        match result {
            Ok(_) => summary.edits += 1,
            Err(EngineError::ChunkNotLoaded(coord)) => {
                log::debug!("Sample edit at {:?} skipped, chunk {:?} not loaded", target, coord);
                summary.rejected_edits += 1;
            }
            Err(error) => return Err(error),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::noise_field::NoiseProfile;

    fn flat_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.noise = NoiseProfile::flat();
        config.terrain.view_distance = [1, 1, 1];
        config
    }

    #[test]
    fn test_warm_up_installs_view_box() {
        let mut app = ApplicationState::new(&flat_config(), Point3::new(0.0, 4.0, 0.0), 1).unwrap();
        assert_eq!(app.warm_up(Duration::from_secs(10)).unwrap(), 8);
        assert_eq!(app.renderer.chunk_count(), 8);
        // Only the four ground chunks have faces: their tops.
        assert_eq!(app.renderer.quad_count(), 4 * 16 * 16);
    }

    #[test]
    fn test_frames_move_viewer_and_count() {
        let mut app = ApplicationState::new(&flat_config(), Point3::new(0.0, 4.0, 0.0), 9).unwrap();
        app.warm_up(Duration::from_secs(10)).unwrap();
        app.set_velocity(Vector3::new(10.0, 0.0, 0.0));

        let summary = app
            .run_frames(90, Duration::from_millis(50))
            .unwrap();

        assert_eq!(summary.frames, 90);
        assert_eq!(summary.edits + summary.rejected_edits, 3);
        assert!(summary.liquid_steps > 0);
        assert!((app.viewer().x - 45.0).abs() < 1e-3);
        assert_eq!(app.engine_state.store().active_count(), 8);
    }
}
