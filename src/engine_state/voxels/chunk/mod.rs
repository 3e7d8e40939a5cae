//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense grid of block bytes for
//! one region of the world, the overlay of player edits that applies to it,
//! and the mesh derived from the two.
//!
//! ## Storage
//!
//! Blocks are stored one byte per voxel in a flat vector indexed
//! `x + size_x * (y + size_y * z)`. The vector is allocated once when the
//! shell is constructed and only overwritten afterwards, so a pooled chunk
//! can be reassigned to a new coordinate without touching the allocator.
//!
//! ## Generation
//!
//! A chunk is filled and meshed on the generation worker:
//! 1. [`Chunk::generate_grid`] samples the [`NoiseField`] for every voxel and
//!    lets the overlay override the procedural value.
//! 2. [`Chunk::build_mesh`] emits one quad per exposed face. Faces on the
//!    grid boundary are resolved against the density function (or an overlay
//!    entry recorded just outside the grid), never against a neighboring
//!    chunk, so chunks can be generated in any order.

use cgmath::Point3;

use crate::core::{ChunkCoord, ChunkDimensions, VoxelCoord};
use crate::engine_state::rendering::meshing::{ChunkMesh, MeshBuilder};

use super::block::block_type::is_solid_byte;
use super::block::{BlockType, BlockTypeSize};
use super::edit_ledger::EditOverlay;
use super::noise_field::NoiseField;

mod chunk_meshing;

/// One region of voxels and its derived geometry.
#[derive(Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    position: ChunkCoord,
    dimensions: ChunkDimensions,
    blocks: Vec<BlockTypeSize>,
    overlay: EditOverlay,
    builder: MeshBuilder,
    mesh: ChunkMesh,
    generated: bool,
}

impl Chunk {
    /// Allocates a new shell filled with air.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    /// * `dimensions` - Grid size shared by every chunk of the world
    pub fn new(position: ChunkCoord, dimensions: ChunkDimensions) -> Self {
        Chunk {
            position,
            dimensions,
            blocks: vec![BlockType::AIR.as_byte(); dimensions.volume()],
            overlay: EditOverlay::new(),
            builder: MeshBuilder::new(),
            mesh: ChunkMesh::default(),
            generated: false,
        }
    }

    /// Reassigns a pooled shell to `position`, dropping its geometry and overlay.
    ///
    /// The block grid keeps its allocation and stale contents until the next
    /// [`Chunk::generate_grid`].
    pub fn reset(&mut self, position: ChunkCoord) {
        self.position = position;
        self.overlay.clear();
        self.mesh = ChunkMesh::default();
        self.generated = false;
    }

    /// The chunk coordinate this shell is assigned to.
    pub fn position(&self) -> ChunkCoord {
        self.position
    }

    /// Grid dimensions.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// World-space voxel coordinate of local `(0, 0, 0)`.
    pub fn origin(&self) -> VoxelCoord {
        self.dimensions.origin(self.position)
    }

    /// Edit overrides applied to this chunk.
    pub fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    /// Mutable access to the overlay, used to seed it before generation.
    pub fn overlay_mut(&mut self) -> &mut EditOverlay {
        &mut self.overlay
    }

    /// The raw block grid.
    pub fn grid(&self) -> &[BlockTypeSize] {
        &self.blocks
    }

    /// The mesh produced by the last [`Chunk::build_mesh`].
    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    /// Whether this chunk has been installed with finished geometry.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub(crate) fn mark_generated(&mut self) {
        self.generated = true;
    }

    /// The grid byte at a local coordinate, or `None` outside the grid.
    pub fn block_at(&self, local: Point3<i32>) -> Option<BlockTypeSize> {
        self.dimensions.index(local).map(|index| self.blocks[index])
    }

    /// Whether the voxel at a local coordinate is solid, or `None` outside the grid.
    pub fn is_solid_at(&self, local: Point3<i32>) -> Option<bool> {
        self.block_at(local).map(is_solid_byte)
    }

    /// Fills the grid from the density function, letting overlay entries win.
    ///
    /// Overlay entries outside the grid are ignored here; they only matter to
    /// [`Chunk::build_mesh`].
    pub fn generate_grid(&mut self, field: &NoiseField) {
        let size = self.dimensions.size();
        let origin = self.origin();

        let mut index = 0;
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let local = Point3::new(x, y, z);
                    self.blocks[index] = match self.overlay.get(local) {
                        Some(byte) => byte,
                        None => field
                            .block_at(Point3::new(origin.x + x, origin.y + y, origin.z + z))
                            .as_byte(),
                    };
                    index += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::noise_field::NoiseProfile;

    fn flat_field() -> NoiseField {
        NoiseField::new(NoiseProfile::flat())
    }

    #[test]
    fn test_generate_grid_follows_density() {
        let field = flat_field();
        let dims = ChunkDimensions::cubic(8);

        let mut ground = Chunk::new(Point3::new(0, -1, 0), dims);
        ground.generate_grid(&field);
        assert!(ground.grid().iter().all(|byte| *byte == 1));

        let mut sky = Chunk::new(Point3::new(3, 0, -2), dims);
        sky.generate_grid(&field);
        assert!(sky.grid().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_overlay_wins_over_density() {
        let field = flat_field();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), ChunkDimensions::cubic(8));
        chunk.overlay_mut().set(Point3::new(2, 3, 4), BlockType::SOLID);
        chunk.overlay_mut().set(Point3::new(8, 3, 4), BlockType::SOLID);
        chunk.generate_grid(&field);

        assert_eq!(chunk.block_at(Point3::new(2, 3, 4)), Some(1));
        assert_eq!(chunk.grid().iter().filter(|byte| **byte == 1).count(), 1);
        assert_eq!(chunk.block_at(Point3::new(8, 3, 4)), None);
    }

    #[test]
    fn test_reset_reuses_grid_allocation() {
        let field = flat_field();
        let mut chunk = Chunk::new(Point3::new(0, -1, 0), ChunkDimensions::cubic(8));
        chunk.overlay_mut().set(Point3::new(0, 0, 0), BlockType::AIR);
        chunk.generate_grid(&field);
        chunk.mark_generated();
        let grid_ptr = chunk.grid().as_ptr();

        chunk.reset(Point3::new(5, 0, 5));
        assert!(!chunk.is_generated());
        assert!(chunk.overlay().is_empty());
        chunk.generate_grid(&field);

        assert_eq!(chunk.grid().as_ptr(), grid_ptr);
        assert_eq!(chunk.grid().len(), 512);
        assert_eq!(chunk.origin(), Point3::new(40, 0, 40));
        assert!(chunk.grid().iter().all(|byte| *byte == 0));
    }
}
