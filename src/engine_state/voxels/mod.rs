//! # Voxel Terrain
//!
//! Everything that describes the solid world: the density function, the
//! chunks sampled from it, the player's edits layered on top, and the
//! bookkeeping that decides which chunks exist.
//!
//! ## Architecture
//!
//! * **Block**: byte encoding of voxels and the six face directions
//! * **NoiseField**: deterministic density and cave signal over world space
//! * **Chunk**: a fixed-size grid plus the mesh derived from it
//! * **EditLedger**: per-chunk overrides that outlive any loaded chunk
//! * **World**: the `ChunkStore` of active chunks and pooled shells
//! * **Streaming**: keeps the active set matched to the viewer
//! * **Tasks**: the job the generation worker runs for each chunk
//!
//! ## Data Flow
//!
//! 1. Streaming activates a coordinate; the store hands out a pooled shell
//!    seeded with the ledger's overlay.
//! 2. The worker fills the grid and builds the mesh.
//! 3. The main thread installs the result if its ticket is still current.
//! 4. Edits write to the ledger and push the affected chunks through 1-3 again.

pub mod block;
pub mod chunk;
pub mod edit_ledger;
pub mod noise_field;
pub mod streaming;
pub mod tasks;
pub mod world;
