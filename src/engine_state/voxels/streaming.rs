//! # Streaming Controller
//!
//! Keeps the set of active chunks matched to a box around the viewer.
//!
//! Each update:
//! 1. The viewer's chunk is `round(position / chunk_size)` per axis, halves to even.
//! 2. Every coordinate `viewer_chunk + offset` with `offset` in
//!    `-view_distance..view_distance` on each axis is wanted. The range is
//!    half-open, so the box is one chunk shallower on the positive side.
//! 3. Wanted coordinates that are active are touched; missing ones are
//!    activated and returned as jobs for the generation worker. With
//!    `generate_new_terrain` off, missing coordinates are left missing.
//! 4. Active coordinates left untouched are deactivated and their shells pooled.

use cgmath::{Point3, Vector3};

use crate::core::ChunkCoord;

use super::chunk::Chunk;
use super::edit_ledger::EditLedger;
use super::world::{ChunkHandle, ChunkStore};

/// What one streaming update changed.
#[derive(Default)]
pub struct StreamingUpdate {
    /// Newly activated coordinates with their shells, ready to submit.
    pub scheduled: Vec<(ChunkHandle, Chunk)>,
    /// Coordinates that left the view box and were deactivated.
    pub unloaded: Vec<ChunkCoord>,
}

/// Decides which chunks should be active around the viewer.
#[derive(Debug, Clone)]
pub struct StreamingController {
    view_distance: Vector3<i32>,
    generate_new_terrain: bool,
    viewer_chunk: Option<ChunkCoord>,
}

impl StreamingController {
    /// Creates a controller.
    ///
    /// # Arguments
    /// * `view_distance` - Per-axis radius of the view box, in chunks
    /// * `generate_new_terrain` - When `false`, updates only unload
    pub fn new(view_distance: Vector3<i32>, generate_new_terrain: bool) -> Self {
        StreamingController {
            view_distance,
            generate_new_terrain,
            viewer_chunk: None,
        }
    }

    /// Per-axis radius of the view box.
    pub fn view_distance(&self) -> Vector3<i32> {
        self.view_distance
    }

    /// The viewer chunk computed by the last update.
    pub fn viewer_chunk(&self) -> Option<ChunkCoord> {
        self.viewer_chunk
    }

    /// Stops or resumes creating chunks. Unloading always runs.
    pub fn set_generate_new_terrain(&mut self, enabled: bool) {
        self.generate_new_terrain = enabled;
    }

    /// Coordinates of the view box around `center`, x fastest.
    pub fn wanted_coords(&self, center: ChunkCoord) -> impl Iterator<Item = ChunkCoord> {
        let vd = self.view_distance;
        (-vd.z..vd.z).flat_map(move |z| {
            (-vd.y..vd.y).flat_map(move |y| {
                (-vd.x..vd.x).map(move |x| Point3::new(center.x + x, center.y + y, center.z + z))
            })
        })
    }

    /// Brings `store` in line with the view box around `viewer`.
    pub fn update(
        &mut self,
        viewer: Point3<f32>,
        store: &mut ChunkStore,
        ledger: &EditLedger,
    ) -> StreamingUpdate {
        let mut update = StreamingUpdate::default();

        let center = store.dimensions().chunk_of_viewer(viewer);
        if self.viewer_chunk != Some(center) {
            log::debug!("Viewer entered chunk {:?}", center);
            self.viewer_chunk = Some(center);
        }

        store.begin_sweep();
        for coord in self.wanted_coords(center) {
            if store.touch(coord) || !self.generate_new_terrain {
                continue;
            }
            if let Some(job) = store.activate(coord, ledger) {
                update.scheduled.push(job);
            }
        }

        update.unloaded = store.end_sweep();
        for coord in &update.unloaded {
            store.deactivate(*coord);
        }

        if !update.scheduled.is_empty() || !update.unloaded.is_empty() {
            log::debug!(
                "Streaming around {:?}: {} scheduled, {} unloaded, {} active",
                center,
                update.scheduled.len(),
                update.unloaded.len(),
                store.active_count()
            );
        }

        update
    }
}
