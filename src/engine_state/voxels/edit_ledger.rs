//! # Edit Ledger
//!
//! Player edits are kept here, keyed by chunk coordinate, independently of
//! whether that chunk is currently loaded. Every (re)generation of a chunk
//! starts from a snapshot of its overlay, so an edit outlives any number of
//! unload/reload cycles.
//!
//! Overlay keys are local coordinates relative to the owning chunk. An edit on
//! a chunk face is also recorded in the neighboring chunk, at a local
//! coordinate one step outside that chunk's grid, so its mesher sees the edit
//! when deciding whether a boundary face is exposed.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::core::{ChunkCoord, EngineError};

use super::block::{BlockType, BlockTypeSize};

const LEDGER_FORMAT_VERSION: u32 = 1;

/// Sparse block overrides for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditOverlay {
    overrides: HashMap<Point3<i32>, BlockTypeSize>,
}

impl EditOverlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// The override at a local coordinate, or `None` to use the procedural value.
    pub fn get(&self, local: Point3<i32>) -> Option<BlockTypeSize> {
        self.overrides.get(&local).copied()
    }

    /// Records an override, replacing any earlier one at the same coordinate.
    pub fn set(&mut self, local: Point3<i32>, block: BlockType) {
        self.overrides.insert(local, block.as_byte());
    }

    /// Drops the override at a local coordinate.
    pub fn remove(&mut self, local: Point3<i32>) -> Option<BlockTypeSize> {
        self.overrides.remove(&local)
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Iterates over `(local, byte)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Point3<i32>, BlockTypeSize)> + '_ {
        self.overrides.iter().map(|(local, byte)| (*local, *byte))
    }

    /// Empties the overlay, keeping its allocation.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }
}

/// World-owned record of every block edit.
#[derive(Debug, Default)]
pub struct EditLedger {
    overlays: HashMap<ChunkCoord, EditOverlay>,
}

/// On-disk form of the ledger. Coordinates are stored as arrays.
#[derive(Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    chunks: Vec<ChunkEdits>,
}

#[derive(Serialize, Deserialize)]
struct ChunkEdits {
    chunk: [i32; 3],
    edits: Vec<VoxelEdit>,
}

#[derive(Serialize, Deserialize)]
struct VoxelEdit {
    local: [i32; 3],
    block: BlockTypeSize,
}

impl EditLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `block` at `local` in the overlay for `chunk`, creating the overlay if needed.
    pub fn record(&mut self, chunk: ChunkCoord, local: Point3<i32>, block: BlockType) {
        self.overlays.entry(chunk).or_default().set(local, block);
    }

    /// The overlay for a chunk, if any edit touched it.
    pub fn overlay(&self, chunk: ChunkCoord) -> Option<&EditOverlay> {
        self.overlays.get(&chunk)
    }

    /// Copies a chunk's overlay into `target`, replacing its contents.
    pub fn copy_overlay_into(&self, chunk: ChunkCoord, target: &mut EditOverlay) {
        target.clear();
        if let Some(overlay) = self.overlays.get(&chunk) {
            target.overrides.extend(overlay.overrides.iter());
        }
    }

    /// Forgets every edit for a chunk.
    pub fn clear(&mut self, chunk: ChunkCoord) -> Option<EditOverlay> {
        self.overlays.remove(&chunk)
    }

    /// Number of chunks with at least one edit.
    pub fn chunk_count(&self) -> usize {
        self.overlays.len()
    }

    /// Total number of overrides across all chunks.
    pub fn edit_count(&self) -> usize {
        self.overlays.values().map(EditOverlay::len).sum()
    }

    /// Serializes the ledger to JSON. Output is sorted so equal ledgers produce equal text.
    pub fn to_json(&self) -> Result<String, EngineError> {
        let mut chunks: Vec<ChunkEdits> = self
            .overlays
            .iter()
            .filter(|(_, overlay)| !overlay.is_empty())
            .map(|(chunk, overlay)| {
                let mut edits: Vec<VoxelEdit> = overlay
                    .iter()
                    .map(|(local, block)| VoxelEdit {
                        local: [local.x, local.y, local.z],
                        block,
                    })
                    .collect();
                edits.sort_by_key(|edit| edit.local);
                ChunkEdits {
                    chunk: [chunk.x, chunk.y, chunk.z],
                    edits,
                }
            })
            .collect();
        chunks.sort_by_key(|entry| entry.chunk);

        let file = LedgerFile {
            version: LEDGER_FORMAT_VERSION,
            chunks,
        };
        serde_json::to_string_pretty(&file).map_err(EngineError::LedgerFormat)
    }

    /// Parses a ledger written by [`EditLedger::to_json`].
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let file: LedgerFile = serde_json::from_str(json).map_err(EngineError::LedgerFormat)?;
        if file.version != LEDGER_FORMAT_VERSION {
            log::warn!(
                "Edit ledger format version {} differs from {}, loading anyway",
                file.version,
                LEDGER_FORMAT_VERSION
            );
        }

        let mut ledger = Self::new();
        for entry in file.chunks {
            let chunk = Point3::from(entry.chunk);
            let overlay = ledger.overlays.entry(chunk).or_default();
            for edit in entry.edits {
                overlay.overrides.insert(Point3::from(edit.local), edit.block);
            }
        }
        Ok(ledger)
    }

    /// Writes the ledger to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let json = self.to_json()?;
        fs::write(path.as_ref(), json).map_err(EngineError::LedgerIo)?;
        log::info!(
            "Saved {} edits in {} chunks to {}",
            self.edit_count(),
            self.chunk_count(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Reads a ledger from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = fs::read_to_string(path.as_ref()).map_err(EngineError::LedgerIo)?;
        Self::from_json(&json)
    }
}
