//! # Coordinates
//!
//! Integer coordinate spaces used across the engine and the conversions
//! between them:
//!
//! * **World position**: continuous `Point3<f32>`, e.g. the viewer or an edit request.
//! * **Voxel coordinate**: the integer minimum corner of a voxel, `floor(world)`.
//! * **Chunk coordinate**: `floor(voxel / dimensions)` per axis.
//! * **Local coordinate**: `voxel - chunk * dimensions`. Normally inside the
//!   grid, but edits also record coordinates one step outside it so that
//!   neighboring chunks see them when culling faces.

use cgmath::{Point3, Vector3};

/// Identifies a chunk in chunk space.
pub type ChunkCoord = Point3<i32>;

/// Identifies a voxel in world space.
pub type VoxelCoord = Point3<i32>;

/// Per-axis size of every chunk, fixed for the lifetime of a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkDimensions {
    size: Vector3<i32>,
}

/// Default chunk edge length in voxels.
pub const DEFAULT_CHUNK_DIMENSION: i32 = 16;

/// Largest number of voxels a single chunk may hold (256³).
pub const MAX_CHUNK_VOLUME: usize = 1 << 24;

impl Default for ChunkDimensions {
    fn default() -> Self {
        Self::cubic(DEFAULT_CHUNK_DIMENSION)
    }
}

impl ChunkDimensions {
    /// Creates dimensions from per-axis sizes.
    ///
    /// Sizes must be positive and their product at most [`MAX_CHUNK_VOLUME`];
    /// configs are checked against [`ChunkDimensions::checked_volume`] first.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(x > 0 && y > 0 && z > 0, "chunk dimensions must be positive");
        debug_assert!(
            Self::checked_volume(x, y, z).is_some_and(|volume| volume <= MAX_CHUNK_VOLUME),
            "chunk volume out of range"
        );
        Self {
            size: Vector3::new(x, y, z),
        }
    }

    /// Creates cubic dimensions.
    pub fn cubic(edge: i32) -> Self {
        Self::new(edge, edge, edge)
    }

    /// Per-axis size.
    pub fn size(&self) -> Vector3<i32> {
        self.size
    }

    /// Voxel count for the given sizes.
    ///
    /// # Returns
    /// `None` if a size is not positive or the product overflows `usize`.
    pub fn checked_volume(x: i32, y: i32, z: i32) -> Option<usize> {
        let x = usize::try_from(x).ok().filter(|size| *size > 0)?;
        let y = usize::try_from(y).ok().filter(|size| *size > 0)?;
        let z = usize::try_from(z).ok().filter(|size| *size > 0)?;
        x.checked_mul(y)?.checked_mul(z)
    }

    /// Number of voxels in one chunk.
    pub fn volume(&self) -> usize {
        self.size.x as usize * self.size.y as usize * self.size.z as usize
    }

    /// Whether a local coordinate lies inside the grid.
    pub fn contains(&self, local: Point3<i32>) -> bool {
        (0..self.size.x).contains(&local.x)
            && (0..self.size.y).contains(&local.y)
            && (0..self.size.z).contains(&local.z)
    }

    /// Flat grid index of a local coordinate, x fastest then y then z.
    ///
    /// # Returns
    /// `None` if the coordinate lies outside the grid.
    pub fn index(&self, local: Point3<i32>) -> Option<usize> {
        if !self.contains(local) {
            return None;
        }
        let (x, y, z) = (local.x as usize, local.y as usize, local.z as usize);
        Some(x + self.size.x as usize * (y + self.size.y as usize * z))
    }

    /// World-space voxel coordinate of a chunk's minimum corner.
    pub fn origin(&self, chunk: ChunkCoord) -> VoxelCoord {
        Point3::new(
            chunk.x * self.size.x,
            chunk.y * self.size.y,
            chunk.z * self.size.z,
        )
    }

    /// The chunk that owns a voxel.
    pub fn chunk_of_voxel(&self, voxel: VoxelCoord) -> ChunkCoord {
        Point3::new(
            voxel.x.div_euclid(self.size.x),
            voxel.y.div_euclid(self.size.y),
            voxel.z.div_euclid(self.size.z),
        )
    }

    /// A voxel's coordinate relative to `chunk`, which need not own it.
    pub fn local_in(&self, voxel: VoxelCoord, chunk: ChunkCoord) -> Point3<i32> {
        let origin = self.origin(chunk);
        Point3::new(voxel.x - origin.x, voxel.y - origin.y, voxel.z - origin.z)
    }

    /// The chunk a viewer is centred on: component-wise round of `position / size`.
    ///
    /// Halves round to even, so a viewer exactly between two chunk centres
    /// does not favor the positive side.
    pub fn chunk_of_viewer(&self, position: Point3<f32>) -> ChunkCoord {
        Point3::new(
            (position.x / self.size.x as f32).round_ties_even() as i32,
            (position.y / self.size.y as f32).round_ties_even() as i32,
            (position.z / self.size.z as f32).round_ties_even() as i32,
        )
    }
}

/// The voxel containing a continuous world position.
pub fn voxel_of_world(position: Point3<f32>) -> VoxelCoord {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}
