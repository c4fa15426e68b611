//! Domain error taxonomy for the move-file engine.
//!
//! Named struct variants over a bare `String`, following the shape the rest
//! of this codebase uses for its error enums: a `#[error("...")]` message
//! template per variant plus small constructor helpers. `ParseError` from the
//! error taxonomy has no variant here: it is "reported at debug level
//! only; never surfaced", so a parse failure is logged at the call site
//! (`tracing::debug!`) and treated as "no match", not constructed as a value.

use crate::model::FileRef;
use relocate_foundation::FoundationError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("source not found: {source}")]
    SourceNotFound { source: FileRef },

    #[error("project not found: {name}")]
    ProjectNotFound { name: String },

    #[error("target collision at {target}: claimed by {sources:?}")]
    TargetCollision {
        target: FileRef,
        sources: Vec<FileRef>,
    },

    #[error("no files matched pattern(s): {patterns}")]
    NoMatch { patterns: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },

    #[error("failed to flush overlay to disk: {0}")]
    Flush(#[from] FoundationError),
}

impl EngineError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn source_not_found(source: FileRef) -> Self {
        Self::SourceNotFound { source }
    }

    pub fn project_not_found(name: impl Into<String>) -> Self {
        Self::ProjectNotFound { name: name.into() }
    }

    pub fn target_collision(target: FileRef, sources: Vec<FileRef>) -> Self {
        Self::TargetCollision { target, sources }
    }

    pub fn no_match(patterns: impl Into<String>) -> Self {
        Self::NoMatch {
            patterns: patterns.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
