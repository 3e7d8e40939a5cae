//! # Engine State Module
//!
//! The core engine module that owns every terrain subsystem and drives them
//! once per tick.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container, constructed once and passed by reference
//! * `voxels` - Density function, chunks, edit ledger, chunk store and streaming
//! * `task_management` - The single generation worker and its queues
//! * `rendering` - Mesh and fluid output boundaries
//! * `liquid` - The water automaton
//!
//! ## Tick
//!
//! 1. Streaming brings the active set in line with the viewer and submits
//!    new chunks to the worker. Unloaded chunks are discarded from the output.
//! 2. At most one finished job is popped and, if still current, installed
//!    and uploaded.
//! 3. The liquid automaton advances unless a chunk is being regenerated.
//!
//! Nothing on this path blocks on the worker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use web_time::Instant;

use crate::application_state::config::EngineConfig;
use crate::core::coordinates::voxel_of_world;
use crate::core::{ChunkCoord, EngineError, VoxelCoord};

use liquid::{LiquidAutomaton, StepReport};
use rendering::{FluidPresenter, MeshSink};
use task_management::TaskManager;
use voxels::{
    block::{BlockSide, BlockType},
    chunk::Chunk,
    edit_ledger::EditLedger,
    noise_field::NoiseField,
    streaming::StreamingController,
    tasks::chunk_generation_task::{ChunkGenerationResult, ChunkGenerationTask},
    world::{ChunkHandle, ChunkStore, SolidityQuery},
};

pub mod liquid;
pub mod rendering;
pub mod task_management;
pub mod voxels;

const GENERATION_WORKER_NAME: &str = "chunk-generation";

/// What one call to [`EngineState::tick`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Chunks newly submitted for generation.
    pub scheduled: usize,
    /// Chunks that left the view box.
    pub unloaded: usize,
    /// The chunk installed and uploaded this tick, if any.
    pub finalized: Option<ChunkCoord>,
    /// The liquid step run this tick, if any.
    pub liquid: Option<StepReport>,
}

/// The main state container for the terrain engine
///
/// Owns the density function, chunk store, edit ledger, streaming controller,
/// generation worker and liquid automaton. All of it lives on the calling
/// thread except chunks that are currently with the worker.
pub struct EngineState {
    field: Arc<NoiseField>,
    store: ChunkStore,
    ledger: EditLedger,
    streaming: StreamingController,
    task_manager: TaskManager<ChunkGenerationTask>,
    liquid: LiquidAutomaton,
    /// Coordinates with an edit-triggered regeneration in flight.
    regenerating: HashSet<ChunkCoord>,
}

impl EngineState {
    /// Builds an engine with no edits and spawns its generation worker.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_ledger(config, EditLedger::new())
    }

    /// Builds an engine whose terrain starts with the edits in `ledger`.
    ///
    /// # Returns
    /// `EngineError::Config` if the config does not validate, or
    /// `EngineError::WorkerSpawn` if the worker thread cannot be started.
    pub fn with_ledger(config: &EngineConfig, ledger: EditLedger) -> Result<Self, EngineError> {
        config.validate()?;

        let task_manager = TaskManager::new(GENERATION_WORKER_NAME)?;
        let dimensions = config.terrain.dimensions();

        log::info!(
            "Engine ready: chunks {:?}, view distance {:?}, seed {}, {} edits loaded",
            config.terrain.chunk_dimensions,
            config.terrain.view_distance,
            config.noise.seed,
            ledger.edit_count()
        );

        Ok(EngineState {
            field: Arc::new(NoiseField::new(config.noise.clone())),
            store: ChunkStore::new(dimensions),
            ledger,
            streaming: StreamingController::new(
                config.terrain.view_distance(),
                config.terrain.generate_new_terrain,
            ),
            task_manager,
            liquid: LiquidAutomaton::new(config.liquid),
            regenerating: HashSet::new(),
        })
    }

    /// Runs one tick of streaming, finalization and liquid simulation.
    ///
    /// # Arguments
    /// * `viewer` - Current viewer position in world space
    /// * `dt` - Time since the previous tick
    /// * `output` - Receives chunk meshes and fluid visuals
    pub fn tick<R>(&mut self, viewer: Point3<f32>, dt: Duration, output: &mut R) -> Result<TickReport, EngineError>
    where
        R: MeshSink + FluidPresenter + ?Sized,
    {
        let update = self.streaming.update(viewer, &mut self.store, &self.ledger);

        for coord in &update.unloaded {
            self.regenerating.remove(coord);
            output.discard_chunk_mesh(*coord);
        }

        let scheduled = update.scheduled.len();
        for (handle, chunk) in update.scheduled {
            self.submit(handle, chunk)?;
        }

        let finalized = match self.task_manager.try_next_result() {
            Some(result) => self.finalize(result, output),
            None => None,
        };

        let liquid = self
            .liquid
            .update(dt, &self.store, !self.regenerating.is_empty(), output);

        Ok(TickReport {
            scheduled,
            unloaded: update.unloaded.len(),
            finalized,
            liquid,
        })
    }

    /// Sets the block at a world position and regenerates every active chunk it touches.
    ///
    /// The edit is recorded for the owning chunk and for each chunk that holds
    /// one of the voxel's six neighbors, loaded or not, so faces along chunk
    /// seams stay consistent.
    ///
    /// # Returns
    /// The coordinates submitted for regeneration, owning chunk first, or
    /// `EngineError::ChunkNotLoaded` if the owning chunk is not active. Nothing
    /// is recorded in that case.
    pub fn set_block(&mut self, position: Point3<f32>, block: BlockType) -> Result<Vec<ChunkCoord>, EngineError> {
        let voxel = voxel_of_world(position);
        let dimensions = self.store.dimensions();
        let owner = dimensions.chunk_of_voxel(voxel);

        if !self.store.is_active(owner) {
            log::debug!("Ignoring edit at {:?}: chunk {:?} is not loaded", voxel, owner);
            return Err(EngineError::ChunkNotLoaded(owner));
        }

        let mut affected = vec![owner];
        for side in BlockSide::all() {
            let coord = dimensions.chunk_of_voxel(voxel + side.offset());
            if !affected.contains(&coord) {
                affected.push(coord);
            }
        }

        for coord in &affected {
            self.ledger
                .record(*coord, dimensions.local_in(voxel, *coord), block);
        }

        let mut scheduled = Vec::with_capacity(affected.len());
        for coord in affected {
            if let Some((handle, chunk)) = self.store.begin_regeneration(coord, &self.ledger) {
                self.submit(handle, chunk)?;
                self.regenerating.insert(coord);
                scheduled.push(coord);
            }
        }

        log::debug!(
            "Set {:?} to {:?}; regenerating {:?}",
            voxel,
            block,
            scheduled
        );

        Ok(scheduled)
    }

    /// Places a solid block at a world position. See [`EngineState::set_block`].
    pub fn place_block(&mut self, position: Point3<f32>) -> Result<Vec<ChunkCoord>, EngineError> {
        self.set_block(position, BlockType::SOLID)
    }

    /// Clears the block at a world position. See [`EngineState::set_block`].
    pub fn destroy_block(&mut self, position: Point3<f32>) -> Result<Vec<ChunkCoord>, EngineError> {
        self.set_block(position, BlockType::AIR)
    }

    /// Adds water at a voxel.
    ///
    /// # Returns
    /// `false` if `amount` was rejected.
    pub fn spawn_water(&mut self, voxel: VoxelCoord, amount: f32) -> bool {
        self.liquid.spawn_water(voxel, amount)
    }

    /// Blocks until every in-flight generation job has been finalized.
    ///
    /// Meant for start-up and tests; [`EngineState::tick`] never waits.
    ///
    /// # Returns
    /// How many chunks were installed, or `EngineError::GenerationTimeout` if
    /// jobs are still outstanding when `timeout` runs out.
    pub fn flush_generation<S>(&mut self, output: &mut S, timeout: Duration) -> Result<usize, EngineError>
    where
        S: MeshSink + ?Sized,
    {
        let deadline = Instant::now() + timeout;
        let mut installed = 0;

        while self.task_manager.tasks_in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let result = if remaining.is_zero() {
                None
            } else {
                self.task_manager.wait_next_result(remaining)?
            };

            match result {
                Some(result) => {
                    if self.finalize(result, output).is_some() {
                        installed += 1;
                    }
                }
                None => {
                    return Err(EngineError::GenerationTimeout {
                        pending: self.task_manager.tasks_in_flight(),
                    });
                }
            }
        }

        Ok(installed)
    }

    /// The installed chunk at `coord`.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.store.query(coord)
    }

    /// Solidity of a voxel, or `None` if its chunk is not installed.
    pub fn solidity(&self, voxel: VoxelCoord) -> Option<bool> {
        self.store.solidity(voxel)
    }

    /// The chunk store.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Every edit made so far.
    pub fn ledger(&self) -> &EditLedger {
        &self.ledger
    }

    /// The liquid automaton.
    pub fn liquid(&self) -> &LiquidAutomaton {
        &self.liquid
    }

    /// The world's density function.
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// The streaming controller.
    pub fn streaming(&self) -> &StreamingController {
        &self.streaming
    }

    /// Stops or resumes creating chunks. Chunks leaving the view box still unload.
    pub fn set_generate_new_terrain(&mut self, enabled: bool) {
        self.streaming.set_generate_new_terrain(enabled);
    }

    /// Whether an edit-triggered regeneration of `coord` is still in flight.
    pub fn is_regenerating(&self, coord: ChunkCoord) -> bool {
        self.regenerating.contains(&coord)
    }

    /// Number of coordinates being regenerated after edits.
    pub fn regenerating_count(&self) -> usize {
        self.regenerating.len()
    }

    /// Jobs submitted to the worker and not yet popped.
    pub fn tasks_in_flight(&self) -> usize {
        self.task_manager.tasks_in_flight()
    }

    fn submit(&mut self, handle: ChunkHandle, chunk: Chunk) -> Result<(), EngineError> {
        log::trace!("Submitting chunk {:?} (ticket {})", handle.coord, handle.ticket);
        self.task_manager
            .publish_task(ChunkGenerationTask::new(handle, chunk, Arc::clone(&self.field)))
    }

    /// Installs a worker result if it is still current and uploads its mesh.
    fn finalize<S>(&mut self, result: ChunkGenerationResult, output: &mut S) -> Option<ChunkCoord>
    where
        S: MeshSink + ?Sized,
    {
        let ChunkGenerationResult { handle, chunk } = result;

        match self.store.install(handle, chunk) {
            Some(installed) => {
                output.upload_chunk_mesh(handle.coord, installed.origin(), installed.mesh());
                self.regenerating.remove(&handle.coord);
                log::debug!("Finalized chunk {:?} (ticket {})", handle.coord, handle.ticket);
                Some(handle.coord)
            }
            None => {
                log::debug!(
                    "Dropped stale result for chunk {:?} (ticket {})",
                    handle.coord,
                    handle.ticket
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::LoggingRenderer;
    use crate::engine_state::voxels::noise_field::NoiseProfile;

    fn flat_engine() -> EngineState {
        let mut config = EngineConfig::default();
        config.noise = NoiseProfile::flat();
        config.terrain.view_distance = [1, 1, 1];
        EngineState::new(&config).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.terrain.chunk_dimensions = [0, 16, 16];
        assert!(matches!(
            EngineState::new(&config),
            Err(EngineError::Config(_))
        ));

        config.terrain.chunk_dimensions = [2048, 2048, 2048];
        assert!(matches!(
            EngineState::new(&config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_edit_far_from_viewer_is_rejected() {
        let mut engine = flat_engine();
        let mut output = LoggingRenderer::new();
        engine
            .tick(Point3::new(0.0, 0.0, 0.0), Duration::ZERO, &mut output)
            .unwrap();

        let result = engine.destroy_block(Point3::new(500.0, -1.0, 0.0));
        assert!(matches!(
            result,
            Err(EngineError::ChunkNotLoaded(coord)) if coord == Point3::new(31, -1, 0)
        ));
        assert_eq!(engine.ledger().edit_count(), 0);
        assert_eq!(engine.regenerating_count(), 0);
    }

    #[test]
    fn test_interior_edit_touches_only_owner() {
        let mut engine = flat_engine();
        let mut output = LoggingRenderer::new();
        engine
            .tick(Point3::new(0.0, 0.0, 0.0), Duration::ZERO, &mut output)
            .unwrap();
        engine
            .flush_generation(&mut output, Duration::from_secs(10))
            .unwrap();

        let scheduled = engine.destroy_block(Point3::new(-8.5, -4.5, -8.5)).unwrap();
        assert_eq!(scheduled, vec![Point3::new(-1, -1, -1)]);
        assert!(engine.is_regenerating(Point3::new(-1, -1, -1)));
        assert_eq!(engine.ledger().chunk_count(), 1);

        engine
            .flush_generation(&mut output, Duration::from_secs(10))
            .unwrap();
        assert_eq!(engine.regenerating_count(), 0);
        assert_eq!(engine.solidity(Point3::new(-9, -5, -9)), Some(false));
    }
}
