use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ArtifactType;

/// Discriminant of [`PipelineError`], kept in run summaries and manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    FileConflict,
    UpstreamMissing,
    RenderTimeout,
    RenderUnavailable,
    Serialization,
    Io,
    Fetch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::FileConflict => "file conflict",
            ErrorKind::UpstreamMissing => "upstream missing",
            ErrorKind::RenderTimeout => "render timeout",
            ErrorKind::RenderUnavailable => "render unavailable",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
            ErrorKind::Fetch => "fetch",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("output already exists: {}", path.display())]
    FileConflict { path: PathBuf },

    #[error("{artifact} requires a successful {requires} artifact")]
    UpstreamMissing {
        artifact: ArtifactType,
        requires: ArtifactType,
    },

    #[error("render timed out after {timeout_ms} ms")]
    RenderTimeout { timeout_ms: u64 },

    #[error("renderer unavailable: {0}")]
    RenderUnavailable(String),

    #[error("could not produce payload: {0}")]
    Serialization(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Wrap a `std::io::Error` with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput(_) => ErrorKind::InvalidInput,
            PipelineError::FileConflict { .. } => ErrorKind::FileConflict,
            PipelineError::UpstreamMissing { .. } => ErrorKind::UpstreamMissing,
            PipelineError::RenderTimeout { .. } => ErrorKind::RenderTimeout,
            PipelineError::RenderUnavailable(_) => ErrorKind::RenderUnavailable,
            PipelineError::Serialization(_) => ErrorKind::Serialization,
            PipelineError::Io { .. } => ErrorKind::Io,
            PipelineError::Fetch(_) => ErrorKind::Fetch,
        }
    }
}
