//! # Block Type Module
//!
//! Defines the block types a voxel grid can hold and their byte encoding.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates the block types stored in a voxel grid.
///
/// The discriminant is the byte written into the grid, so new variants must be
/// appended to keep previously recorded edits meaningful.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Never meshed, always open to fluid.
    AIR = 0,

    /// Generic terrain material.
    SOLID = 1,
}

impl BlockType {
    /// Decodes a grid byte.
    ///
    /// # Returns
    /// `None` if the byte does not name a known block type.
    pub fn from_byte(byte: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(byte)
    }

    /// Encodes this block type as its grid byte.
    pub fn as_byte(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Whether this block blocks fluid and hides neighboring faces.
    pub fn is_solid(self) -> bool {
        self != BlockType::AIR
    }
}

/// Whether a raw grid byte is solid. Unknown bytes count as solid so that a
/// newer block type never leaks fluid or opens holes in a mesh.
pub fn is_solid_byte(byte: BlockTypeSize) -> bool {
    byte != BlockType::AIR.as_byte()
}
