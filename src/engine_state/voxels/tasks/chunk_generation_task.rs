//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask`, which fills a chunk's grid
//! and builds its mesh on the generation worker. The chunk shell travels with
//! the task and comes back inside the result, so the worker has exclusive
//! access to it for the whole job.

use std::sync::Arc;

use web_time::Instant;

use crate::engine_state::{
    task_management::task::Task,
    voxels::{chunk::Chunk, noise_field::NoiseField, world::ChunkHandle},
};

/// A task that generates one chunk's voxels and geometry.
pub struct ChunkGenerationTask {
    handle: ChunkHandle,
    chunk: Chunk,
    field: Arc<NoiseField>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `handle` - Identifies the job for staleness checks on return
    /// * `chunk` - A shell already assigned to `handle.coord` with its overlay seeded
    /// * `field` - The world's density function
    pub fn new(handle: ChunkHandle, chunk: Chunk, field: Arc<NoiseField>) -> Self {
        ChunkGenerationTask {
            handle,
            chunk,
            field,
        }
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationResult {
    /// The job this result belongs to.
    pub handle: ChunkHandle,
    /// The chunk with its grid filled and mesh built.
    pub chunk: Chunk,
}

impl Task for ChunkGenerationTask {
    type Output = ChunkGenerationResult;

    fn process(self) -> ChunkGenerationResult {
        let started = Instant::now();
        let mut chunk = self.chunk;

        chunk.generate_grid(&self.field);
        let quads = chunk.build_mesh(&self.field);

        log::trace!(
            "Generated chunk {:?} (ticket {}): {} quads in {:?}",
            self.handle.coord,
            self.handle.ticket,
            quads,
            started.elapsed()
        );

        ChunkGenerationResult {
            handle: self.handle,
            chunk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChunkDimensions;
    use crate::engine_state::voxels::edit_ledger::EditLedger;
    use crate::engine_state::voxels::noise_field::NoiseProfile;
    use crate::engine_state::voxels::world::ChunkStore;
    use cgmath::Point3;

    #[test]
    fn test_process_fills_and_meshes() {
        let field = Arc::new(NoiseField::new(NoiseProfile::flat()));
        let mut store = ChunkStore::new(ChunkDimensions::cubic(8));
        let (handle, chunk) = store
            .activate(Point3::new(0, -1, 0), &EditLedger::new())
            .unwrap();

        let result = ChunkGenerationTask::new(handle, chunk, field).process();
        assert_eq!(result.handle, handle);
        assert!(result.chunk.grid().iter().all(|byte| *byte == 1));
        assert_eq!(result.chunk.mesh().quad_count(), 64);
    }
}
