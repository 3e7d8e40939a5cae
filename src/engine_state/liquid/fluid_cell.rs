/// Simulation state of one voxel's worth of liquid.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FluidCell {
    pub(super) mass: f32,
    pub(super) pending: f32,
    pub(super) visible: bool,
}

impl FluidCell {
    /// A cell holding `mass` that has not been presented yet.
    pub fn with_mass(mass: f32) -> Self {
        FluidCell {
            mass,
            pending: mass,
            visible: false,
        }
    }

    /// Mass after the last committed step. `1.0` is a full, uncompressed cell.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether the presenter currently holds a drawable for this cell.
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
