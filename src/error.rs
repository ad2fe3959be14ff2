//! Error types for the storage engine.
//!
//! Every public operation returns a [`StoreError`] on failure rather than
//! letting a low-level I/O or parse error escape the contract. The three
//! variants correspond to the three failure classes the engine recognizes:
//!
//! | Variant | Scope |
//! |---------|-------|
//! | [`StoreError::SandboxUnavailable`] | fatal — the user root cannot be created or accessed |
//! | [`StoreError::ArtifactIo`] | local to one save/load/export/mirror call |
//! | [`StoreError::DocumentCorrupt`] | a session or log document failed to parse |

use std::path::PathBuf;
use thiserror::Error;

/// Failure surface of the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The per-user storage root could not be created or accessed.
    /// Every subsequent operation against the same root will fail the
    /// same way; nothing is cached as successful.
    #[error("storage unavailable at {path}: {source}")]
    SandboxUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single artifact operation failed (bad payload encoding, missing
    /// file, copy failure). Non-fatal to the rest of the engine.
    #[error("artifact operation failed: {0}")]
    ArtifactIo(String),

    /// A persisted document exists but does not parse.
    #[error("corrupt document {path}: {reason}")]
    DocumentCorrupt { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        StoreError::ArtifactIo(format!("{}: {}", context.into(), err))
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
