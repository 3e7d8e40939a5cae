//! Rendering boundary of the terrain engine.
//!
//! The engine does not own GPU resources. It hands finished chunk meshes and
//! fluid visual updates to whatever implements [`MeshSink`] and
//! [`FluidPresenter`], always from the main thread and at most one chunk mesh
//! per tick. [`LoggingRenderer`] is a headless implementation that only keeps
//! counters and logs.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;

use crate::core::{ChunkCoord, VoxelCoord};

pub mod meshing;
mod vertex;

pub use meshing::ChunkMesh;
pub use vertex::Vertex;

/// Receives chunk geometry on finalize and notice of unloads.
pub trait MeshSink {
    /// Installs (or replaces) the mesh for `chunk`. Vertices are relative to `origin`.
    fn upload_chunk_mesh(&mut self, chunk: ChunkCoord, origin: VoxelCoord, mesh: &ChunkMesh);

    /// Drops any geometry held for `chunk`.
    fn discard_chunk_mesh(&mut self, chunk: ChunkCoord);
}

/// Where and how full a fluid cell should be drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FluidVisual {
    /// Fill fraction in `[0, 1]`.
    pub fill: f32,
    /// Centre of the visible water volume in world space.
    pub position: Point3<f32>,
}

/// Owns the drawable objects for fluid cells.
pub trait FluidPresenter {
    /// Creates or updates the drawable for `cell`.
    fn show_fluid(&mut self, cell: VoxelCoord, visual: FluidVisual);

    /// Destroys the drawable for `cell`. Only called for cells previously shown.
    fn hide_fluid(&mut self, cell: VoxelCoord);
}

/// Headless renderer that tracks what would be on screen.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    chunk_quads: HashMap<ChunkCoord, usize>,
    visible_fluid: HashSet<VoxelCoord>,
    uploads: usize,
}

impl LoggingRenderer {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks with geometry currently installed.
    pub fn chunk_count(&self) -> usize {
        self.chunk_quads.len()
    }

    /// Total quads across installed chunks.
    pub fn quad_count(&self) -> usize {
        self.chunk_quads.values().sum()
    }

    /// Number of fluid cells currently drawn.
    pub fn fluid_count(&self) -> usize {
        self.visible_fluid.len()
    }

    /// Number of mesh uploads received so far.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}

impl MeshSink for LoggingRenderer {
    fn upload_chunk_mesh(&mut self, chunk: ChunkCoord, origin: VoxelCoord, mesh: &ChunkMesh) {
        log::trace!(
            "Uploading chunk {:?} at {:?}: {} quads, {} bytes",
            chunk,
            origin,
            mesh.quad_count(),
            mesh.vertex_bytes().len() + mesh.index_bytes().len()
        );
        self.chunk_quads.insert(chunk, mesh.quad_count());
        self.uploads += 1;
    }

    fn discard_chunk_mesh(&mut self, chunk: ChunkCoord) {
        self.chunk_quads.remove(&chunk);
    }
}

impl FluidPresenter for LoggingRenderer {
    fn show_fluid(&mut self, cell: VoxelCoord, visual: FluidVisual) {
        log::trace!("Fluid {:?} fill {:.3}", cell, visual.fill);
        self.visible_fluid.insert(cell);
    }

    fn hide_fluid(&mut self, cell: VoxelCoord) {
        self.visible_fluid.remove(&cell);
    }
}
