//! Fan-out core: pure data model, chunking, naming, and identity rules.
//!
//! Nothing in this crate touches the filesystem; IO lives in `fanout_engine`.
mod artifact;
mod chunk;
mod config;
mod error;
mod graph;
mod slug;
mod summary;

pub use artifact::{ArtifactSpec, ArtifactType, ChunkManifest};
pub use chunk::{aggregate_name, part_count, part_name, parse_part_name, split};
pub use config::{
    PipelineConfig, Viewport, DEFAULT_CHUNK_BYTE_LIMIT, DEFAULT_RENDER_TIMEOUT_MS,
    DEFAULT_WORKERS, MAX_CHUNK_BYTE_LIMIT, MAX_RENDER_TIMEOUT_MS,
};
pub use error::{ErrorKind, PipelineError};
pub use graph::TaskGraph;
pub use slug::{
    assign, normalize_url, sanitize_component, DatasetIdentity, DOMAIN_AGGREGATE_SLUG,
};
pub use summary::{FormatFailure, FormatOutcome, RunSummary};
