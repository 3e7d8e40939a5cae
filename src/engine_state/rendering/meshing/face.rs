use cgmath::Point3;

use crate::engine_state::voxels::block::BlockSide;

/// One exposed voxel face, as four lattice corners.
///
/// Corners are ordered bottom-left, bottom-right, top-left, top-right in the
/// face's `(width, length)` basis. See [`BlockSide::basis`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// `[origin, origin + width, origin + length, origin + width + length]`
    pub corners: [Point3<i32>; 4],
    /// Which side of the voxel this face covers.
    pub side: BlockSide,
}

impl Quad {
    /// Builds the face of the voxel at `voxel` (local coordinates) on `side`.
    pub fn new(voxel: Point3<i32>, side: BlockSide) -> Self {
        let basis = side.basis();
        let origin = voxel + basis.origin;
        Quad {
            corners: [
                origin,
                origin + basis.width,
                origin + basis.length,
                origin + basis.width + basis.length,
            ],
            side,
        }
    }

    /// Triangle indices for this quad, given the index of its first vertex.
    ///
    /// Positive faces wind `(0, 1, 2), (2, 1, 3)`; negative faces flip to
    /// `(0, 2, 1), (2, 3, 1)`. Either way the front face is counter-clockwise
    /// seen from outside the voxel.
    pub fn indices(&self, base: u32) -> [u32; 6] {
        if self.side.is_negative() {
            [base, base + 2, base + 1, base + 2, base + 3, base + 1]
        } else {
            [base, base + 1, base + 2, base + 2, base + 1, base + 3]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn to_f32(p: Point3<i32>) -> Point3<f32> {
        Point3::new(p.x as f32, p.y as f32, p.z as f32)
    }

    #[test]
    fn test_triangles_face_outward() {
        let voxel = Point3::new(2, 3, 4);
        let center = Point3::new(2.5, 3.5, 4.5);

        for side in BlockSide::all() {
            let quad = Quad::new(voxel, side);
            let offset = side.offset();
            let outward = Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32);

            for triangle in quad.indices(0).chunks(3) {
                let a = to_f32(quad.corners[triangle[0] as usize]);
                let b = to_f32(quad.corners[triangle[1] as usize]);
                let c = to_f32(quad.corners[triangle[2] as usize]);
                let normal = (b - a).cross(c - a);
                assert!(normal.dot(outward) > 0.0, "{:?} winds inward", side);
                // The face lies half a voxel from the center along the normal.
                assert_eq!((a - center).dot(outward), 0.5, "{:?}", side);
            }
        }
    }

    #[test]
    fn test_indices_are_offset_by_base() {
        let quad = Quad::new(Point3::new(0, 0, 0), BlockSide::TOP);
        assert_eq!(quad.indices(8), [8, 9, 10, 10, 9, 11]);
        let quad = Quad::new(Point3::new(0, 0, 0), BlockSide::BOTTOM);
        assert_eq!(quad.indices(4), [4, 6, 5, 6, 7, 5]);
    }
}
