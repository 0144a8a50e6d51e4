//! Per-format payload generators.
//!
//! Generators only produce bytes and say where they belong; chunking and
//! writing are the sink's job.

mod html;
mod json;
mod markdown;
mod pdf;
mod text;

use std::sync::Arc;

use fanout_core::{ArtifactSpec, ArtifactType, DatasetIdentity, PipelineError};

use crate::convert::Converter;
use crate::extract::Extractor;
use crate::output_dir::OutputDirs;
use crate::render::{PdfOptions, Renderer};
use crate::source::SourceDocument;

pub use html::HtmlGenerator;
pub use json::JsonGenerator;
pub use markdown::MarkdownGenerator;
pub use pdf::PdfGenerator;
pub use text::{markdown_to_text, TextGenerator};

/// Everything a generator may read for one dataset run.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub identity: DatasetIdentity,
    pub base_name: String,
    pub source: SourceDocument,
    pub output_dirs: OutputDirs,
    pub pdf: PdfOptions,
}

impl GenerationContext {
    pub fn spec(&self, artifact_type: ArtifactType) -> Result<ArtifactSpec, PipelineError> {
        let dir = self.output_dirs.dir(artifact_type)?;
        Ok(ArtifactSpec::new(artifact_type, self.base_name.clone(), dir))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub payload: Vec<u8>,
    pub spec: ArtifactSpec,
}

#[async_trait::async_trait]
pub trait FormatGenerator: Send + Sync {
    fn artifact_type(&self) -> ArtifactType;

    /// `upstream` is the aggregate payload of this format's predecessor in the
    /// task graph, or `None` if it has none or it failed.
    async fn generate(
        &self,
        ctx: &GenerationContext,
        upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError>;
}

/// One generator per artifact type, sharing the given collaborators.
pub fn standard_generators(
    renderer: Arc<dyn Renderer>,
    converter: Arc<dyn Converter>,
    extractor: Arc<dyn Extractor>,
) -> Vec<Arc<dyn FormatGenerator>> {
    vec![
        Arc::new(HtmlGenerator::new(renderer.clone())),
        Arc::new(MarkdownGenerator::new(converter)),
        Arc::new(TextGenerator),
        Arc::new(JsonGenerator::new(renderer.clone(), extractor)),
        Arc::new(PdfGenerator::new(renderer)),
    ]
}

/// The predecessor's payload, or `UpstreamMissing`.
pub(crate) fn require_upstream<'a>(
    upstream: Option<&'a [u8]>,
    artifact: ArtifactType,
    requires: ArtifactType,
) -> Result<&'a [u8], PipelineError> {
    upstream.ok_or(PipelineError::UpstreamMissing { artifact, requires })
}

pub(crate) fn utf8(payload: &[u8], what: ArtifactType) -> Result<&str, PipelineError> {
    std::str::from_utf8(payload)
        .map_err(|err| PipelineError::serialization(format!("{what} payload is not UTF-8: {err}")))
}
