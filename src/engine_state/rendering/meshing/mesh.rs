//! Mesh buffers produced for each chunk.
//!
//! Geometry is accumulated in a [`MeshBuilder`] while a chunk is scanned and
//! then frozen into a [`ChunkMesh`] with fixed-size buffers. A chunk's mesh is
//! always rebuilt from scratch; nothing patches an existing `ChunkMesh`.

use super::face::Quad;
use crate::engine_state::rendering::Vertex;

/// Finished geometry of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    vertices: Box<[Vertex]>,
    indices: Box<[u32]>,
}

impl ChunkMesh {
    /// Vertex positions, four per quad.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle indices into [`ChunkMesh::vertices`], six per quad.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of emitted faces.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the chunk produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Append-only accumulator for quads.
///
/// Builders live inside pooled chunks so their capacity is reused between
/// regenerations.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one quad's four vertices and two triangles.
    pub fn add_quad(&mut self, quad: &Quad) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(quad.corners.iter().map(|corner| Vertex::new(*corner)));
        self.indices.extend_from_slice(&quad.indices(base));
    }

    /// Number of quads appended since the last [`MeshBuilder::finish`].
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Copies the accumulated geometry into fixed buffers and resets the builder.
    pub fn finish(&mut self) -> ChunkMesh {
        let mesh = ChunkMesh {
            vertices: self.vertices.as_slice().into(),
            indices: self.indices.as_slice().into(),
        };
        self.vertices.clear();
        self.indices.clear();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::BlockSide;
    use cgmath::Point3;

    #[test]
    fn test_finish_resets_builder() {
        let mut builder = MeshBuilder::new();
        builder.add_quad(&Quad::new(Point3::new(0, 0, 0), BlockSide::TOP));
        builder.add_quad(&Quad::new(Point3::new(1, 0, 0), BlockSide::LEFT));

        let mesh = builder.finish();
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.indices()[6], 4);
        assert_eq!(mesh.vertex_bytes().len(), 8 * 12);
        assert_eq!(builder.quad_count(), 0);
        assert!(builder.finish().is_empty());
    }
}
