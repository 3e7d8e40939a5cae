//! # Core Module
//!
//! Fundamental types used throughout the engine: coordinate spaces and the
//! error enums returned by fallible operations.

pub mod coordinates;
pub mod error;

pub use coordinates::{ChunkCoord, ChunkDimensions, VoxelCoord};
pub use error::{ConfigError, EngineError};
