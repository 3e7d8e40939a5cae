#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A streaming voxel terrain engine with edit persistence and a water
//! cellular automaton.
//!
//! Terrain is sampled from a deterministic noise density in fixed-size
//! chunks around a moving viewer. Chunks are generated and meshed on a single
//! worker thread and finalized on the main thread at most one per tick. Block
//! edits are kept in a ledger that outlives any loaded chunk, so unloading
//! and reloading reproduces them exactly.
//!
//! ## Key Modules
//!
//! * `application_state` - Configuration and the headless frame loop
//! * `core` - Coordinate spaces and error types
//! * `engine_state` - The engine proper: voxels, generation worker, rendering boundary, liquid
//!
//! ## Usage
//!
//! ```no_run
//! fn main() -> Result<(), voxel_terrain::EngineError> {
//!     voxel_terrain::run(Some("config/engine.json".to_string()))
//! }
//! ```
//!
//! Embedding the engine directly:
//!
//! ```no_run
//! use std::time::Duration;
//! use cgmath::Point3;
//! use voxel_terrain::{EngineConfig, EngineState, LoggingRenderer};
//!
//! # fn main() -> Result<(), voxel_terrain::EngineError> {
//! let mut engine = EngineState::new(&EngineConfig::default())?;
//! let mut renderer = LoggingRenderer::new();
//! let viewer = Point3::new(0.0, 24.0, 0.0);
//!
//! engine.tick(viewer, Duration::from_millis(16), &mut renderer)?;
//! engine.flush_generation(&mut renderer, Duration::from_secs(30))?;
//! engine.destroy_block(Point3::new(3.0, 10.0, -2.0))?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use cgmath::Point3;

pub mod application_state;
pub mod core;
pub mod engine_state;

pub use crate::application_state::config::{EngineConfig, TerrainConfig};
pub use crate::application_state::{ApplicationState, RunSummary};
pub use crate::core::{ChunkCoord, ChunkDimensions, ConfigError, EngineError, VoxelCoord};
pub use crate::engine_state::liquid::{LiquidAutomaton, LiquidConfig, StepReport};
pub use crate::engine_state::rendering::{ChunkMesh, FluidPresenter, FluidVisual, LoggingRenderer, MeshSink, Vertex};
pub use crate::engine_state::voxels::noise_field::{NoiseField, NoiseProfile};
pub use crate::engine_state::{EngineState, TickReport};

/// Frames simulated by [`run`].
pub const HEADLESS_FRAMES: u64 = 600;

/// Fixed timestep of the headless loop.
pub const FRAME_DURATION: Duration = Duration::from_micros(16_667);

/// How long start-up waits for the first view box to generate.
pub const WARM_UP_TIMEOUT: Duration = Duration::from_secs(60);

/// Seed for the scripted edits of the headless loop.
const SESSION_SEED: u64 = 0x7e44_a1;

/// Installs the log backend. Safe to call more than once.
#[cfg(not(target_family = "wasm"))]
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG");

    if log_builder.try_init().is_ok() {
        log::info!("Logger initialized");
    }
}

/// Installs the log backend. Safe to call more than once.
#[cfg(target_family = "wasm")]
pub fn init_logger() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("Logger initialized");
    }
}

/// Runs a headless session: load config, warm up, simulate, report.
///
/// # Arguments
/// * `config_path` - Optional JSON config; defaults are used when absent
pub fn run(config_path: Option<String>) -> Result<(), EngineError> {
    init_logger();

    let config = match config_path {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => {
            log::info!("No config given, using defaults");
            EngineConfig::default()
        }
    };

    let started = web_time::Instant::now();
    let mut app = ApplicationState::new(&config, Point3::new(0.0, 24.0, 0.0), SESSION_SEED)?;
    app.warm_up(WARM_UP_TIMEOUT)?;

    let summary = app.run_frames(HEADLESS_FRAMES, FRAME_DURATION)?;

    log::info!(
        "Ran {} frames in {:?}: {} chunks finalized, {} edits ({} rejected), {} liquid steps",
        summary.frames,
        started.elapsed(),
        summary.finalized,
        summary.edits,
        summary.rejected_edits,
        summary.liquid_steps
    );
    log::info!(
        "Final state: {} active chunks, {} shells allocated, {} quads on screen, {} water cells ({:.3} mass)",
        app.engine_state.store().active_count(),
        app.engine_state.store().allocated_count(),
        app.renderer.quad_count(),
        app.engine_state.liquid().cell_count(),
        app.engine_state.liquid().total_mass()
    );

    Ok(())
}
