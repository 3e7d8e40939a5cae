//! # Meshing
//!
//! Turns exposed voxel faces into vertex and index buffers. One quad is
//! emitted per exposed face; adjacent faces are never merged.

pub mod face;
pub mod mesh;

pub use face::Quad;
pub use mesh::{ChunkMesh, MeshBuilder};
