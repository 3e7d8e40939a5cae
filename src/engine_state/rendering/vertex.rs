//! Vertex data structures for chunk meshes.
//!
//! The layout is plain old data so a renderer can upload a mesh's vertex
//! slice byte-for-byte.

use cgmath::Point3;

/// A mesh vertex in chunk-local space.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position relative to the chunk's minimum corner.
    pub position: [f32; 3],
}

impl Vertex {
    /// Creates a vertex at an integer lattice corner.
    pub fn new(corner: Point3<i32>) -> Self {
        Vertex {
            position: [corner.x as f32, corner.y as f32, corner.z as f32],
        }
    }

    /// The position as a point.
    pub fn point(&self) -> Point3<f32> {
        Point3::from(self.position)
    }
}
