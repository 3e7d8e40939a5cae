//! # Voxel Task System
//!
//! Tasks that run on the generation worker.

pub mod chunk_generation_task;
