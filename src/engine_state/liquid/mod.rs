//! # Liquid Automaton
//!
//! A sparse cellular automaton for water. Each cell is one voxel holding a
//! mass, where `1.0` is a full, uncompressed cell. Cells only ever push mass
//! to their neighbors; nothing is pulled.
//!
//! ## Step
//!
//! For every cell with positive mass, in this order, each stage spending from
//! the cell's remaining budget:
//! 1. **Down**: `stable_state(remaining + below) - below`, capped by `max_speed`.
//! 2. **Sideways** (-x, +z, +x, -z): `(mass - neighbor) / 6`.
//! 3. **Up**: `remaining - stable_state(remaining + above)`, capped by `max_speed`.
//!    Only compressed water rises.
//!
//! Flows above `min_flow` are halved, then clamped to be non-negative and no
//! larger than what is left. Outflows and inflows go to each cell's `pending`
//! mass and are committed together once every cell has been visited.
//!
//! A neighbor takes part only if the terrain reports it as loaded air.
//! Neighbors without a cell get one created in a staging map that is merged
//! after the pass.
//!
//! ## Presentation
//!
//! After each step cells at or below `min_draw` lose their drawable, and cells
//! at or below `min_mass` are removed with their residue discarded. Every
//! other cell is shown with a fill of `clamp(mass, 0, 1)`, or `1` when the cell
//! above it is drawn too.

use std::collections::HashMap;
use std::time::Duration;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, VoxelCoord};
use crate::engine_state::rendering::{FluidPresenter, FluidVisual};
use crate::engine_state::voxels::block::BlockSide;
use crate::engine_state::voxels::world::SolidityQuery;

mod fluid_cell;

pub use fluid_cell::FluidCell;

const HORIZONTAL_FLOW_ORDER: [BlockSide; 4] = [
    BlockSide::LEFT,
    BlockSide::FRONT,
    BlockSide::RIGHT,
    BlockSide::BACK,
];

/// Tuning constants of the automaton.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidConfig {
    /// When `false`, [`LiquidAutomaton::update`] never steps.
    pub enabled: bool,
    /// Mass of a full, uncompressed cell.
    pub max_mass: f32,
    /// Extra mass a cell may hold per cell of water above it.
    pub max_compress: f32,
    /// Cells at or below this mass are removed.
    pub min_mass: f32,
    /// Flows above this amount are halved.
    pub min_flow: f32,
    /// Cap on vertical flow per step.
    pub max_speed: f32,
    /// Cells at or below this mass are not drawn.
    pub min_draw: f32,
    /// Seconds between steps.
    pub step_interval: f32,
}

impl Default for LiquidConfig {
    fn default() -> Self {
        LiquidConfig {
            enabled: true,
            max_mass: 1.0,
            max_compress: 0.02,
            min_mass: 0.0001,
            min_flow: 0.01,
            max_speed: 1.0,
            min_draw: 0.01,
            step_interval: 0.05,
        }
    }
}

impl LiquidConfig {
    /// How much of `total` mass the lower of two stacked cells holds at rest.
    pub fn stable_state(&self, total: f32) -> f32 {
        if total <= 1.0 {
            1.0
        } else if total < 2.0 * self.max_mass + self.max_compress {
            (self.max_mass * self.max_mass + total * self.max_compress)
                / (self.max_mass + self.max_compress)
        } else {
            (total + self.max_compress) / 2.0
        }
    }

    fn damp(&self, flow: f32) -> f32 {
        if flow > self.min_flow {
            flow * 0.5
        } else {
            flow
        }
    }

    /// Rejects constants that would stall or destabilise the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("liquid.max_mass", self.max_mass),
            ("liquid.max_speed", self.max_speed),
            ("liquid.step_interval", self.step_interval),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }

        let non_negative = [
            ("liquid.max_compress", self.max_compress),
            ("liquid.min_mass", self.min_mass),
            ("liquid.min_flow", self.min_flow),
            ("liquid.min_draw", self.min_draw),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be zero or positive, got {}", value),
                });
            }
        }

        if self.min_mass > self.min_draw {
            return Err(ConfigError::InvalidValue {
                field: "liquid.min_mass",
                reason: format!(
                    "must not exceed liquid.min_draw ({} > {})",
                    self.min_mass, self.min_draw
                ),
            });
        }

        Ok(())
    }
}

/// Summary of one simulation step.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Cells alive after the step.
    pub cells: usize,
    /// Cells created for neighbors during the step.
    pub created: usize,
    /// Cells removed for falling to the mass floor.
    pub removed: usize,
    /// Mass held by all cells after the step.
    pub total_mass: f32,
    /// Mass dropped with the removed cells.
    pub discarded_mass: f32,
}

/// Sparse water simulation over whatever terrain is loaded.
#[derive(Debug, Default)]
pub struct LiquidAutomaton {
    config: LiquidConfig,
    cells: HashMap<VoxelCoord, FluidCell>,
    staged: HashMap<VoxelCoord, FluidCell>,
    scratch: Vec<VoxelCoord>,
    since_step: Duration,
    steps: u64,
}

impl LiquidAutomaton {
    /// Creates an empty automaton.
    pub fn new(config: LiquidConfig) -> Self {
        LiquidAutomaton {
            config,
            ..Default::default()
        }
    }

    /// The tuning constants in use.
    pub fn config(&self) -> &LiquidConfig {
        &self.config
    }

    /// Turns stepping on or off. Existing cells are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Adds `amount` of water at `voxel`, creating the cell if needed.
    ///
    /// # Returns
    /// `false` if `amount` is not a positive finite number; nothing changes then.
    pub fn spawn_water(&mut self, voxel: VoxelCoord, amount: f32) -> bool {
        if !(amount.is_finite() && amount > 0.0) {
            log::warn!("Ignoring water spawn of {} at {:?}", amount, voxel);
            return false;
        }

        let cell = self.cells.entry(voxel).or_default();
        cell.mass += amount;
        cell.pending = cell.mass;
        true
    }

    /// The cell at `voxel`, if any.
    pub fn cell(&self, voxel: VoxelCoord) -> Option<&FluidCell> {
        self.cells.get(&voxel)
    }

    /// All live cells.
    pub fn cells(&self) -> impl Iterator<Item = (VoxelCoord, &FluidCell)> + '_ {
        self.cells.iter().map(|(voxel, cell)| (*voxel, cell))
    }

    /// Number of live cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Sum of every cell's mass.
    pub fn total_mass(&self) -> f32 {
        self.cells.values().map(|cell| cell.mass).sum()
    }

    /// Number of steps run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances the step timer by `dt` and steps once it reaches the interval.
    ///
    /// Does nothing, and lets no time accumulate, while `regenerating` is set
    /// or the automaton is disabled.
    pub fn update<Q, P>(
        &mut self,
        dt: Duration,
        world: &Q,
        regenerating: bool,
        presenter: &mut P,
    ) -> Option<StepReport>
    where
        Q: SolidityQuery + ?Sized,
        P: FluidPresenter + ?Sized,
    {
        if !self.config.enabled || regenerating {
            return None;
        }

        self.since_step += dt;
        if self.since_step.as_secs_f32() < self.config.step_interval {
            return None;
        }
        self.since_step = Duration::ZERO;

        Some(self.run_step(world, presenter))
    }

    /// Runs one step and presents the result immediately, ignoring the timer.
    pub fn run_step<Q, P>(&mut self, world: &Q, presenter: &mut P) -> StepReport
    where
        Q: SolidityQuery + ?Sized,
        P: FluidPresenter + ?Sized,
    {
        let created = self.simulate(world);
        let (removed, discarded_mass) = self.present(presenter);
        self.steps += 1;

        let report = StepReport {
            cells: self.cells.len(),
            created,
            removed,
            total_mass: self.total_mass(),
            discarded_mass,
        };

        log::trace!(
            "Liquid step {}: {} cells (+{} -{}), mass {:.4}",
            self.steps,
            report.cells,
            report.created,
            report.removed,
            report.total_mass
        );

        report
    }

    fn simulate<Q: SolidityQuery + ?Sized>(&mut self, world: &Q) -> usize {
        self.staged.clear();
        self.scratch.clear();
        for (voxel, cell) in self.cells.iter_mut() {
            cell.pending = cell.mass;
            if cell.mass > 0.0 {
                self.scratch.push(*voxel);
            }
        }

        // Pending sums depend on visit order; a fixed order keeps steps reproducible.
        self.scratch.sort_unstable_by_key(|voxel| (voxel.z, voxel.y, voxel.x));
        let order = std::mem::take(&mut self.scratch);
        for voxel in &order {
            self.push_flow(*voxel, world);
        }
        self.scratch = order;

        let created = self.staged.len();
        self.cells.extend(self.staged.drain());
        for cell in self.cells.values_mut() {
            cell.mass = cell.pending;
        }

        created
    }

    fn push_flow<Q: SolidityQuery + ?Sized>(&mut self, voxel: VoxelCoord, world: &Q) {
        let config = self.config;
        let mass = match self.cells.get(&voxel) {
            Some(cell) => cell.mass,
            None => return,
        };
        let mut remaining = mass;

        let below = voxel + BlockSide::BOTTOM.offset();
        if let Some(below_mass) = self.open_neighbor_mass(below, world) {
            let flow = config.stable_state(remaining + below_mass) - below_mass;
            let flow = clamp_flow(config.damp(flow), config.max_speed.min(remaining));
            self.transfer(voxel, below, flow);
            remaining -= flow;
        }

        for side in HORIZONTAL_FLOW_ORDER {
            if remaining <= 0.0 {
                return;
            }

            let next = voxel + side.offset();
            if let Some(next_mass) = self.open_neighbor_mass(next, world) {
                let flow = clamp_flow(config.damp((mass - next_mass) / 6.0), remaining);
                self.transfer(voxel, next, flow);
                remaining -= flow;
            }
        }

        if remaining <= 0.0 {
            return;
        }

        let above = voxel + BlockSide::TOP.offset();
        if let Some(above_mass) = self.open_neighbor_mass(above, world) {
            let flow = remaining - config.stable_state(remaining + above_mass);
            let flow = clamp_flow(config.damp(flow), config.max_speed.min(remaining));
            self.transfer(voxel, above, flow);
        }
    }

    /// Mass of a neighbor that can receive water, creating a staged cell for it if needed.
    fn open_neighbor_mass<Q: SolidityQuery + ?Sized>(
        &mut self,
        voxel: VoxelCoord,
        world: &Q,
    ) -> Option<f32> {
        if world.solidity(voxel) != Some(false) {
            return None;
        }
        if let Some(cell) = self.cells.get(&voxel) {
            return Some(cell.mass);
        }
        Some(self.staged.entry(voxel).or_default().mass)
    }

    fn transfer(&mut self, from: VoxelCoord, to: VoxelCoord, flow: f32) {
        if flow <= 0.0 {
            return;
        }
        if let Some(cell) = self.cells.get_mut(&from) {
            cell.pending -= flow;
        }
        if let Some(cell) = self
            .cells
            .get_mut(&to)
            .or_else(|| self.staged.get_mut(&to))
        {
            cell.pending += flow;
        }
    }

    fn present<P: FluidPresenter + ?Sized>(&mut self, presenter: &mut P) -> (usize, f32) {
        let config = self.config;
        let mut removed = 0;
        let mut discarded = 0.0;

        self.scratch.clear();
        self.scratch.extend(self.cells.keys().copied());
        self.scratch.sort_unstable_by_key(|voxel| (voxel.z, voxel.y, voxel.x));

        for index in 0..self.scratch.len() {
            let voxel = self.scratch[index];
            let above_drawn = self
                .cells
                .get(&(voxel + BlockSide::TOP.offset()))
                .is_some_and(|above| above.mass > config.min_draw);
            let Some(cell) = self.cells.get_mut(&voxel) else {
                continue;
            };

            if cell.mass <= config.min_draw {
                if cell.visible {
                    presenter.hide_fluid(voxel);
                    cell.visible = false;
                }
                if cell.mass <= config.min_mass {
                    discarded += cell.mass;
                    removed += 1;
                    self.cells.remove(&voxel);
                }
                continue;
            }

            let fill = if above_drawn {
                1.0
            } else {
                cell.mass.clamp(0.0, 1.0)
            };
            cell.visible = true;
            presenter.show_fluid(
                voxel,
                FluidVisual {
                    fill,
                    position: Point3::new(
                        voxel.x as f32 + 0.5,
                        voxel.y as f32 + fill / 2.0,
                        voxel.z as f32 + 0.5,
                    ),
                },
            );
        }

        (removed, discarded)
    }
}

fn clamp_flow(flow: f32, max: f32) -> f32 {
    flow.min(max).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Recorder {
        shown: HashMap<VoxelCoord, FluidVisual>,
        hidden: Vec<VoxelCoord>,
    }

    impl FluidPresenter for Recorder {
        fn show_fluid(&mut self, cell: VoxelCoord, visual: FluidVisual) {
            self.shown.insert(cell, visual);
        }

        fn hide_fluid(&mut self, cell: VoxelCoord) {
            self.shown.remove(&cell);
            self.hidden.push(cell);
        }
    }

    fn assert_close(actual: f32, expected: f32, tolerance: f32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_stable_state_regions() {
        let config = LiquidConfig::default();

        assert_eq!(config.stable_state(0.4), 1.0);
        assert_eq!(config.stable_state(1.0), 1.0);
        assert_close(config.stable_state(1.5), 1.03 / 1.02, 1e-6);
        assert_close(config.stable_state(3.0), 1.51, 1e-6);

        // The compressed and linear regions meet at 2 * max_mass + max_compress.
        assert_close(config.stable_state(2.0199), 1.02, 1e-4);
        assert_close(config.stable_state(2.02), 1.02, 1e-6);
    }

    #[test]
    fn test_shaft_settles_to_full_cell_and_compressed_residue() {
        let config = LiquidConfig::default();
        let mut automaton = LiquidAutomaton::new(config);
        let mut recorder = Recorder::default();
        let shaft = |voxel: VoxelCoord| Some(!(voxel.x == 0 && voxel.z == 0 && voxel.y >= 0));
        let bottom = Point3::new(0, 0, 0);
        let top = Point3::new(0, 1, 0);

        assert!(automaton.spawn_water(bottom, 2.0));
        for _ in 0..60 {
            automaton.run_step(&shaft, &mut recorder);
        }

        let settled = config.stable_state(2.0);
        assert_close(automaton.cell(bottom).unwrap().mass(), settled, 1e-4);
        assert_close(automaton.cell(top).unwrap().mass(), 2.0 - settled, 1e-4);
        assert_close(automaton.total_mass(), 2.0, 1e-4);
        assert_eq!(automaton.cell_count(), 2);

        // The lower cell is drawn full because water sits on top of it.
        let lower = recorder.shown[&bottom];
        assert_eq!(lower.fill, 1.0);
        assert_eq!(lower.position, Point3::new(0.5, 0.5, 0.5));
        let upper = recorder.shown[&top];
        assert_close(upper.fill, 2.0 - settled, 1e-4);
        assert_close(upper.position.y, 1.0 + upper.fill / 2.0, 1e-6);
    }

    #[test]
    fn test_basin_conserves_mass() {
        let config = LiquidConfig::default();
        let mut automaton = LiquidAutomaton::new(config);
        let mut recorder = Recorder::default();
        let basin = |voxel: VoxelCoord| Some(voxel.y < 0 || voxel.x.abs() > 3 || voxel.z.abs() > 3);

        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..24 {
            let voxel = Point3::new(rng.i32(-3..=3), rng.i32(0..4), rng.i32(-3..=3));
            automaton.spawn_water(voxel, 0.05 + rng.f32() * 1.5);
        }
        let initial = automaton.total_mass();

        let mut discarded = 0.0;
        for _ in 0..40 {
            let report = automaton.run_step(&basin, &mut recorder);
            assert!(report.discarded_mass <= report.removed as f32 * config.min_mass + 1e-9);
            discarded += report.discarded_mass;
        }

        assert_close(automaton.total_mass() + discarded, initial, 1e-3);
        for (voxel, cell) in automaton.cells() {
            assert!(cell.mass() >= 0.0);
            assert_eq!(basin(voxel), Some(false), "water inside rock at {:?}", voxel);
        }
    }

    #[test]
    fn test_steps_are_reproducible() {
        let config = LiquidConfig::default();
        let basin = |voxel: VoxelCoord| Some(voxel.y < 0 || voxel.x.abs() > 2 || voxel.z.abs() > 2);

        let mut rng = fastrand::Rng::with_seed(11);
        let mut spawns = Vec::new();
        for x in -2..=2 {
            for z in -2..=2 {
                if rng.bool() {
                    spawns.push((Point3::new(x, rng.i32(0..3), z), 0.1 + rng.f32()));
                }
            }
        }
        assert!(spawns.len() > 1);

        // Same water, spawned in opposite orders into separately hashed maps.
        let mut forward = LiquidAutomaton::new(config);
        let mut backward = LiquidAutomaton::new(config);
        for (voxel, amount) in &spawns {
            forward.spawn_water(*voxel, *amount);
        }
        for (voxel, amount) in spawns.iter().rev() {
            backward.spawn_water(*voxel, *amount);
        }

        for _ in 0..25 {
            forward.run_step(&basin, &mut Recorder::default());
            backward.run_step(&basin, &mut Recorder::default());
        }

        assert_eq!(forward.cell_count(), backward.cell_count());
        for (voxel, cell) in forward.cells() {
            let other = backward.cell(voxel).unwrap();
            assert_eq!(cell.mass().to_bits(), other.mass().to_bits(), "cell {:?}", voxel);
        }
    }

    #[test]
    fn test_tiny_cell_is_hidden_then_removed() {
        let config = LiquidConfig::default();
        let mut automaton = LiquidAutomaton::new(config);
        let mut recorder = Recorder::default();
        let pocket = Point3::new(5, 5, 5);
        let sealed = move |voxel: VoxelCoord| Some(voxel != pocket);

        automaton.spawn_water(pocket, 0.5);
        automaton.run_step(&sealed, &mut recorder);
        assert!(automaton.cell(pocket).unwrap().is_visible());
        assert!(recorder.shown.contains_key(&pocket));

        automaton.cells.get_mut(&pocket).unwrap().mass = 0.005;
        let report = automaton.run_step(&sealed, &mut recorder);
        assert_eq!(recorder.hidden, vec![pocket]);
        assert_eq!(report.removed, 0);
        assert!(!automaton.cell(pocket).unwrap().is_visible());

        automaton.cells.get_mut(&pocket).unwrap().mass = 0.00005;
        let report = automaton.run_step(&sealed, &mut recorder);
        assert_eq!(report.removed, 1);
        assert_close(report.discarded_mass, 0.00005, 1e-9);
        assert!(automaton.cell(pocket).is_none());
        assert_eq!(recorder.hidden.len(), 1);
    }

    #[test]
    fn test_unloaded_neighbors_are_skipped() {
        let mut automaton = LiquidAutomaton::new(LiquidConfig::default());
        let mut recorder = Recorder::default();
        let half_loaded = |voxel: VoxelCoord| {
            if voxel.x > 0 {
                None
            } else {
                Some(voxel.y < 0)
            }
        };

        automaton.spawn_water(Point3::new(0, 0, 0), 1.0);
        let report = automaton.run_step(&half_loaded, &mut recorder);

        assert!(automaton.cell(Point3::new(1, 0, 0)).is_none());
        assert!(automaton.cell(Point3::new(-1, 0, 0)).unwrap().mass() > 0.0);
        assert!(report.created >= 3);
        assert_close(automaton.total_mass(), 1.0, 1e-6);
    }

    #[test]
    fn test_update_waits_for_interval_and_regeneration() {
        let mut automaton = LiquidAutomaton::new(LiquidConfig::default());
        let mut recorder = Recorder::default();
        let floor = |voxel: VoxelCoord| Some(voxel.y < 0);
        automaton.spawn_water(Point3::new(0, 0, 0), 1.0);
        let tick = Duration::from_millis(30);

        assert!(automaton.update(tick, &floor, false, &mut recorder).is_none());
        assert!(automaton.update(tick, &floor, true, &mut recorder).is_none());
        assert!(automaton.update(tick, &floor, false, &mut recorder).is_some());
        assert!(automaton.update(Duration::from_millis(10), &floor, false, &mut recorder).is_none());
        assert_eq!(automaton.steps(), 1);

        automaton.set_enabled(false);
        assert!(automaton.update(Duration::from_secs(1), &floor, false, &mut recorder).is_none());
        assert_eq!(automaton.steps(), 1);
    }

    #[test]
    fn test_spawn_rejects_unusable_amounts() {
        let mut automaton = LiquidAutomaton::new(LiquidConfig::default());
        let voxel = Point3::new(0, 0, 0);

        assert!(!automaton.spawn_water(voxel, 0.0));
        assert!(!automaton.spawn_water(voxel, -1.0));
        assert!(!automaton.spawn_water(voxel, f32::NAN));
        assert!(!automaton.spawn_water(voxel, f32::INFINITY));
        assert_eq!(automaton.cell_count(), 0);

        assert!(automaton.spawn_water(voxel, 0.25));
        assert!(automaton.spawn_water(voxel, 0.25));
        assert_eq!(automaton.cell(voxel).unwrap().mass(), 0.5);
    }

    #[test]
    fn test_validate_rejects_bad_constants() {
        assert!(LiquidConfig::default().validate().is_ok());

        let stalled = LiquidConfig {
            step_interval: 0.0,
            ..LiquidConfig::default()
        };
        assert!(matches!(
            stalled.validate(),
            Err(ConfigError::InvalidValue { field: "liquid.step_interval", .. })
        ));

        let inverted = LiquidConfig {
            min_mass: 0.5,
            ..LiquidConfig::default()
        };
        assert!(inverted.validate().is_err());

        let fields: HashSet<&str> = [
            LiquidConfig { max_speed: f32::NAN, ..LiquidConfig::default() },
            LiquidConfig { min_flow: -1.0, ..LiquidConfig::default() },
        ]
        .iter()
        .filter_map(|config| match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => Some(field),
            _ => None,
        })
        .collect();
        assert_eq!(fields, HashSet::from(["liquid.max_speed", "liquid.min_flow"]));
    }
}
