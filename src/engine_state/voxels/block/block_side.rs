//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the per-face basis
//! table used to emit quads.
//!
//! ## Quad convention
//!
//! Every face is described by two in-plane axes (`width`, `length`) and an
//! origin offset from the voxel's minimum corner. Bases are chosen so that
//! `width x length` equals the positive axis, which makes the outward normal
//! of the three positive faces follow from counter-clockwise winding and the
//! three negative faces need their winding flipped.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

/// The in-plane axes and origin offset of one face.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceBasis {
    /// First in-plane axis.
    pub width: Vector3<i32>,
    /// Second in-plane axis.
    pub length: Vector3<i32>,
    /// Offset from the voxel's minimum corner to the quad's first corner.
    pub origin: Vector3<i32>,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The unit step from a voxel to the neighbor behind this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// True for the faces pointing down an axis (BACK, BOTTOM, LEFT).
    pub fn is_negative(self) -> bool {
        matches!(self, BlockSide::BACK | BlockSide::BOTTOM | BlockSide::LEFT)
    }

    /// Looks up this face's quad basis.
    pub fn basis(self) -> FaceBasis {
        let x = Vector3::new(1, 0, 0);
        let y = Vector3::new(0, 1, 0);
        let z = Vector3::new(0, 0, 1);
        let zero = Vector3::new(0, 0, 0);

        let (width, length) = match self {
            BlockSide::LEFT | BlockSide::RIGHT => (y, z),
            BlockSide::BOTTOM | BlockSide::TOP => (z, x),
            BlockSide::BACK | BlockSide::FRONT => (x, y),
        };

        let origin = if self.is_negative() {
            zero
        } else {
            self.offset()
        };

        FaceBasis {
            width,
            length,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Zero;

    fn dot(a: Vector3<i32>, b: Vector3<i32>) -> i32 {
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    #[test]
    fn test_opposite_sides_cancel() {
        let sum = BlockSide::all()
            .iter()
            .fold(Vector3::zero(), |acc, side| acc + side.offset());
        assert_eq!(sum, Vector3::zero());
    }

    #[test]
    fn test_basis_spans_face_plane() {
        for side in BlockSide::all() {
            let basis = side.basis();
            let normal = side.offset();
            assert_eq!(dot(basis.width, normal), 0, "{:?}", side);
            assert_eq!(dot(basis.length, normal), 0, "{:?}", side);
            let cross = basis.width.cross(basis.length);
            let expected = if side.is_negative() { -normal } else { normal };
            assert_eq!(cross, expected, "{:?}", side);
        }
    }
}
