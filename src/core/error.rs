//! Error types for configuration loading and engine operations.

use super::coordinates::ChunkCoord;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] serde_json::Error),

    /// A value parsed but is outside its usable range.
    #[error("invalid config value `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors surfaced by the terrain engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The generation worker thread could not be started.
    #[error("failed to spawn generation worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The generation worker hung up; no further chunks can be generated.
    #[error("generation worker disconnected")]
    WorkerDisconnected,

    /// An edit targeted a position whose chunk is not active.
    #[error("no chunk loaded at {0:?}")]
    ChunkNotLoaded(ChunkCoord),

    /// A blocking flush gave up before every in-flight job came back.
    #[error("timed out waiting for {pending} chunk generation job(s)")]
    GenerationTimeout {
        /// Jobs still outstanding.
        pending: usize,
    },

    /// The edit ledger file could not be read or written.
    #[error("failed to access edit ledger: {0}")]
    LedgerIo(#[source] std::io::Error),

    /// The edit ledger file is not valid JSON for this format.
    #[error("failed to encode edit ledger: {0}")]
    LedgerFormat(#[source] serde_json::Error),

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
