//! Shared error types for crates that are not themselves part of the
//! move-file domain (I/O and JSON failures from the filesystem flush
//! adapter and from any external table a caller hands in as JSON).
//!
//! The domain-specific error enum lives in `relocate-engine::error` and
//! converts a [`FoundationError`] via `#[from]` for the one case the flush
//! adapter can fail after planning has already succeeded.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that originate below the move-file domain: real I/O, (de)serialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FoundationError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to (de)serialize JSON: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FoundationError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            message: message.into(),
            source,
        }
    }
}

pub type FoundationResult<T> = Result<T, FoundationError>;
