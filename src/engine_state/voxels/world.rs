//! # World Module
//!
//! This module provides the `ChunkStore`, the authoritative record of which
//! chunks are active, which of them have finished geometry, and the pool of
//! shells waiting to be reused.
//!
//! ## Lifecycle
//!
//! ```text
//! activate ──► pending (shell with the worker) ──► install ──► generated
//!                  │                                   │
//!                  └────────────── deactivate ◄────────┘──► shell back to pool
//! ```
//!
//! Every activation or regeneration issues a fresh ticket. A worker result is
//! installed only if its ticket is still the newest one for an active
//! coordinate; anything else is stale and its shell is recycled. This is the
//! only cancellation mechanism: nothing is interrupted, outdated work is
//! simply not installed.
//!
//! ## Sweeps
//!
//! Streaming marks the coordinates it still wants between
//! [`ChunkStore::begin_sweep`] and [`ChunkStore::end_sweep`]; entries whose
//! sweep counter was not bumped are reported as out of range.
//!
//! The store lives on the main thread. Chunks handed to the worker are owned
//! by the job until they come back through [`ChunkStore::install`].

use std::collections::HashMap;

use crate::core::{ChunkCoord, ChunkDimensions, VoxelCoord};

use super::block::block_type::is_solid_byte;
use super::block::BlockTypeSize;
use super::chunk::Chunk;
use super::edit_ledger::EditLedger;

/// Read-only solidity lookups over whatever terrain is loaded.
pub trait SolidityQuery {
    /// Whether the voxel is solid, or `None` if its chunk is not loaded yet.
    fn solidity(&self, voxel: VoxelCoord) -> Option<bool>;
}

impl<F> SolidityQuery for F
where
    F: Fn(VoxelCoord) -> Option<bool>,
{
    fn solidity(&self, voxel: VoxelCoord) -> Option<bool> {
        self(voxel)
    }
}

/// Identifies one generation job for one coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHandle {
    /// The coordinate being generated.
    pub coord: ChunkCoord,
    /// Unique per job; newer jobs for a coordinate have larger tickets.
    pub ticket: u64,
}

#[derive(Debug)]
struct ChunkEntry {
    ticket: u64,
    installed: Option<Chunk>,
    last_sweep: u64,
}

/// Active chunks keyed by coordinate, plus a pool of recycled shells.
#[derive(Debug)]
pub struct ChunkStore {
    dimensions: ChunkDimensions,
    entries: HashMap<ChunkCoord, ChunkEntry>,
    pool: Vec<Chunk>,
    next_ticket: u64,
    sweep: u64,
    allocated: usize,
}

impl ChunkStore {
    /// Creates an empty store for chunks of the given size.
    pub fn new(dimensions: ChunkDimensions) -> Self {
        ChunkStore {
            dimensions,
            entries: HashMap::new(),
            pool: Vec::new(),
            next_ticket: 0,
            sweep: 0,
            allocated: 0,
        }
    }

    /// Grid size of every chunk in this store.
    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    /// Marks `coord` active and prepares a shell for its first generation.
    ///
    /// The shell comes from the pool when one is available and carries a copy
    /// of the coordinate's overlay from `ledger`.
    ///
    /// # Returns
    /// The job handle and shell to submit, or `None` if `coord` is already active.
    pub fn activate(&mut self, coord: ChunkCoord, ledger: &EditLedger) -> Option<(ChunkHandle, Chunk)> {
        if self.entries.contains_key(&coord) {
            return None;
        }

        let ticket = self.issue_ticket();
        self.entries.insert(
            coord,
            ChunkEntry {
                ticket,
                installed: None,
                last_sweep: self.sweep,
            },
        );

        let chunk = self.prepare_shell(coord, ledger);
        Some((ChunkHandle { coord, ticket }, chunk))
    }

    /// Prepares a fresh job for an already active coordinate.
    ///
    /// Any earlier job still in flight for `coord` becomes stale. The currently
    /// installed chunk stays queryable until the new one is installed.
    ///
    /// # Returns
    /// `None` if `coord` is not active.
    pub fn begin_regeneration(
        &mut self,
        coord: ChunkCoord,
        ledger: &EditLedger,
    ) -> Option<(ChunkHandle, Chunk)> {
        if !self.entries.contains_key(&coord) {
            return None;
        }

        let ticket = self.issue_ticket();
        if let Some(entry) = self.entries.get_mut(&coord) {
            entry.ticket = ticket;
        }

        let chunk = self.prepare_shell(coord, ledger);
        Some((ChunkHandle { coord, ticket }, chunk))
    }

    /// Accepts a finished job.
    ///
    /// # Returns
    /// The installed chunk, or `None` if the result was stale and has been recycled.
    pub fn install(&mut self, handle: ChunkHandle, mut chunk: Chunk) -> Option<&Chunk> {
        let current = self
            .entries
            .get(&handle.coord)
            .is_some_and(|entry| entry.ticket == handle.ticket);

        if !current {
            self.recycle(chunk);
            return None;
        }

        chunk.mark_generated();
        let entry = self.entries.get_mut(&handle.coord)?;
        if let Some(previous) = entry.installed.replace(chunk) {
            self.pool.push(previous);
        }
        entry.installed.as_ref()
    }

    /// Removes `coord`, returning its installed shell (if any) to the pool.
    ///
    /// # Returns
    /// `true` if the coordinate was active.
    pub fn deactivate(&mut self, coord: ChunkCoord) -> bool {
        match self.entries.remove(&coord) {
            Some(entry) => {
                if let Some(chunk) = entry.installed {
                    self.recycle(chunk);
                }
                true
            }
            None => false,
        }
    }

    /// Returns a shell to the pool.
    pub fn recycle(&mut self, chunk: Chunk) {
        debug_assert_eq!(chunk.dimensions(), self.dimensions);
        self.pool.push(chunk);
    }

    /// The installed chunk at `coord`, or `None` if it is inactive or still pending.
    pub fn query(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.entries
            .get(&coord)
            .and_then(|entry| entry.installed.as_ref())
    }

    /// Whether `coord` is active, generated or not.
    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    /// The grid byte of a world voxel, if its chunk is installed.
    pub fn block_at_voxel(&self, voxel: VoxelCoord) -> Option<BlockTypeSize> {
        let coord = self.dimensions.chunk_of_voxel(voxel);
        let local = self.dimensions.local_in(voxel, coord);
        self.query(coord)?.block_at(local)
    }

    /// Starts a streaming sweep. Coordinates not touched before
    /// [`ChunkStore::end_sweep`] are reported as out of range.
    pub fn begin_sweep(&mut self) {
        self.sweep += 1;
    }

    /// Marks an active coordinate as still wanted.
    ///
    /// # Returns
    /// `false` if `coord` is not active.
    pub fn touch(&mut self, coord: ChunkCoord) -> bool {
        match self.entries.get_mut(&coord) {
            Some(entry) => {
                entry.last_sweep = self.sweep;
                true
            }
            None => false,
        }
    }

    /// Coordinates that were not touched during the current sweep.
    pub fn end_sweep(&self) -> Vec<ChunkCoord> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.last_sweep != self.sweep)
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Active coordinates, generated or not.
    pub fn active_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.entries.keys().copied()
    }

    /// Number of active coordinates.
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of active coordinates with installed geometry.
    pub fn installed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.installed.is_some())
            .count()
    }

    /// Number of shells waiting in the pool.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Number of shells ever constructed by this store.
    pub fn allocated_count(&self) -> usize {
        self.allocated
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn prepare_shell(&mut self, coord: ChunkCoord, ledger: &EditLedger) -> Chunk {
        let mut chunk = match self.pool.pop() {
            Some(mut chunk) => {
                chunk.reset(coord);
                chunk
            }
            None => {
                self.allocated += 1;
                Chunk::new(coord, self.dimensions)
            }
        };
        ledger.copy_overlay_into(coord, chunk.overlay_mut());
        chunk
    }
}

impl SolidityQuery for ChunkStore {
    fn solidity(&self, voxel: VoxelCoord) -> Option<bool> {
        self.block_at_voxel(voxel).map(is_solid_byte)
    }
}
