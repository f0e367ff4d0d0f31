// ── Sprout Atoms: Error Types ──────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Config, Control…).
//   • The `#[from]` attribute wires std/external error conversions.
//   • Nothing in the tick path returns an error: the engine always produces
//     a valid (possibly empty) output. Errors exist for the edges —
//     persistence, config loading, and rejected control events.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite / rusqlite state-store failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Engine configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A control event was rejected; engine state is unchanged.
    #[error("Invalid control event: {0}")]
    InvalidControl(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create an invalid-control rejection with a caller-facing reason.
    pub fn invalid_control(reason: impl Into<String>) -> Self {
        Self::InvalidControl(reason.into())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All fallible engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;
