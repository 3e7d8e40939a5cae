use cgmath::Point3;

use super::Chunk;
use crate::engine_state::rendering::meshing::Quad;
use crate::engine_state::voxels::block::block_type::is_solid_byte;
use crate::engine_state::voxels::block::BlockSide;
use crate::engine_state::voxels::noise_field::NoiseField;

impl Chunk {
    /// Rebuilds the mesh from the current grid.
    ///
    /// Every solid voxel gets one quad for each face whose neighbor is open.
    /// Must run after [`Chunk::generate_grid`] with the same field.
    ///
    /// # Returns
    /// The number of quads emitted.
    pub fn build_mesh(&mut self, field: &NoiseField) -> usize {
        let size = self.dimensions.size();

        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let local = Point3::new(x, y, z);
                    if !self.is_solid_at(local).unwrap_or(false) {
                        continue;
                    }

                    for side in BlockSide::all() {
                        if self.is_open(local + side.offset(), field) {
                            self.builder.add_quad(&Quad::new(local, side));
                        }
                    }
                }
            }
        }

        self.mesh = self.builder.finish();
        self.mesh.quad_count()
    }

    /// Whether the voxel at `local` (possibly one step outside the grid) is air.
    ///
    /// An overlay entry decides first. Otherwise in-grid voxels read the grid
    /// and out-of-grid voxels re-evaluate the density function.
    fn is_open(&self, local: Point3<i32>, field: &NoiseField) -> bool {
        if let Some(byte) = self.overlay.get(local) {
            return !is_solid_byte(byte);
        }

        match self.dimensions.index(local) {
            Some(index) => !is_solid_byte(self.blocks[index]),
            None => {
                let origin = self.origin();
                let world = Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z);
                !field.block_at(world).is_solid()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChunkDimensions;
    use crate::engine_state::voxels::block::BlockType;
    use crate::engine_state::voxels::noise_field::NoiseProfile;

    fn generated(field: &NoiseField, position: Point3<i32>, dims: ChunkDimensions) -> Chunk {
        let mut chunk = Chunk::new(position, dims);
        chunk.generate_grid(field);
        chunk.build_mesh(field);
        chunk
    }

    fn assert_index_bounds(chunk: &Chunk) {
        let mesh = chunk.mesh();
        assert_eq!(mesh.indices().len() % 3, 0);
        assert_eq!(mesh.indices().len(), mesh.vertices().len() / 4 * 6);
        let vertex_count = mesh.vertices().len() as u32;
        assert!(mesh.indices().iter().all(|index| *index < vertex_count));
    }

    #[test]
    fn test_lone_voxel_has_six_faces() {
        let field = NoiseField::new(NoiseProfile::flat());
        let mut chunk = Chunk::new(Point3::new(0, 2, 0), ChunkDimensions::cubic(8));
        chunk.overlay_mut().set(Point3::new(4, 4, 4), BlockType::SOLID);
        chunk.generate_grid(&field);

        assert_eq!(chunk.build_mesh(&field), 6);
        assert_eq!(chunk.mesh().vertices().len(), 24);
        assert_eq!(chunk.mesh().indices().len(), 36);
        assert_index_bounds(&chunk);
    }

    #[test]
    fn test_ground_exposes_only_top_faces() {
        let field = NoiseField::new(NoiseProfile::flat());
        let chunk = generated(&field, Point3::new(3, -1, -7), ChunkDimensions::cubic(16));

        // Side and bottom neighbors outside the grid are solid by density.
        assert_eq!(chunk.mesh().quad_count(), 16 * 16);
        assert!(chunk
            .mesh()
            .vertices()
            .iter()
            .all(|vertex| vertex.position[1] == 16.0));
        assert_index_bounds(&chunk);
    }

    #[test]
    fn test_overlay_outside_grid_exposes_boundary_face() {
        let field = NoiseField::new(NoiseProfile::flat());
        let mut chunk = Chunk::new(Point3::new(0, -1, 0), ChunkDimensions::cubic(16));
        // A neighbor chunk's voxel was dug out right next to this chunk's +x face.
        chunk.overlay_mut().set(Point3::new(16, 15, 5), BlockType::AIR);
        chunk.generate_grid(&field);

        assert_eq!(chunk.build_mesh(&field), 16 * 16 + 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_mesh() {
        let field = NoiseField::new(NoiseProfile::flat());
        let mut chunk = generated(&field, Point3::new(0, -1, 0), ChunkDimensions::cubic(8));
        let first = chunk.mesh().clone();

        chunk.build_mesh(&field);
        assert_eq!(chunk.mesh(), &first);
    }

    #[test]
    fn test_seams_match_loaded_neighbors() {
        let profile = NoiseProfile {
            frequency: 0.05,
            strength: 16.0,
            recede: 0.2,
            ..NoiseProfile::default()
        };
        let field = NoiseField::new(profile);
        let dims = ChunkDimensions::cubic(16);
        let mut boundary_faces = 0;

        for cx in -2..2 {
            for cy in -1..1 {
                let a = generated(&field, Point3::new(cx, cy, 0), dims);
                let b = generated(&field, Point3::new(cx + 1, cy, 0), dims);
                assert_index_bounds(&a);

                // Faces A would show if it could read B's grid directly.
                let mut expected = 0;
                for z in 0..16 {
                    for y in 0..16 {
                        let a_solid = a.is_solid_at(Point3::new(15, y, z)).unwrap();
                        let b_solid = b.is_solid_at(Point3::new(0, y, z)).unwrap();
                        if a_solid && !b_solid {
                            expected += 1;
                        }
                    }
                }

                // +x faces on the seam are the only quads lying entirely on x = 16.
                let vertices = a.mesh().vertices();
                let emitted = vertices
                    .chunks(4)
                    .filter(|quad| quad.iter().all(|vertex| vertex.position[0] == 16.0))
                    .count();

                assert_eq!(emitted, expected, "seam between x={} and x={}", cx, cx + 1);
                boundary_faces += emitted;
            }
        }

        assert!(boundary_faces > 0);
    }
}
