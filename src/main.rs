//! # Voxel Terrain Entry Point
//!
//! Runs a headless session through the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- config/engine.json
//! ```
//!
//! The config path is optional; defaults are used without it.

fn main() {
    #[cfg(not(target_family = "wasm"))]
    {
        let config_path = std::env::args().nth(1);
        if let Err(error) = voxel_terrain::run(config_path) {
            log::error!("{}", error);
            std::process::exit(1);
        }
    }
}
