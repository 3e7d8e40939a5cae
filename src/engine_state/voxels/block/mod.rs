//! # Block Module
//!
//! Block-level vocabulary shared by chunk generation, meshing, edits and the
//! liquid automaton: the byte-sized block type and the six axis-aligned faces.

pub mod block_side;
pub mod block_type;

pub use block_side::BlockSide;
pub use block_type::BlockType;

/// The underlying integer type used to represent block types in a voxel grid.
pub type BlockTypeSize = u8;
