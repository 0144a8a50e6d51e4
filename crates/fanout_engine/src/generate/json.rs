use std::sync::Arc;

use fanout_core::{ArtifactType, PipelineError};
use serde::Serialize;

use super::{utf8, FormatGenerator, GeneratedArtifact, GenerationContext};
use crate::extract::{Extractor, StructuredDocument};
use crate::render::Renderer;

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    dataset: String,
    source_url: Option<&'a str>,
    #[serde(flatten)]
    document: StructuredDocument,
}

/// Structured JSON built straight from the source, independent of the HTML artifact.
pub struct JsonGenerator {
    renderer: Arc<dyn Renderer>,
    extractor: Arc<dyn Extractor>,
}

impl JsonGenerator {
    pub fn new(renderer: Arc<dyn Renderer>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            renderer,
            extractor,
        }
    }
}

#[async_trait::async_trait]
impl FormatGenerator for JsonGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Json
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        _upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let html = self.renderer.render_to_html(&ctx.source).await?;
        let html = utf8(&html, ArtifactType::Html)?;
        let document = JsonDocument {
            dataset: ctx.identity.label(),
            source_url: ctx.source.source_url.as_deref(),
            document: self.extractor.extract(html),
        };
        let mut payload = serde_json::to_vec_pretty(&document)
            .map_err(|err| PipelineError::serialization(err.to_string()))?;
        payload.push(b'\n');
        Ok(GeneratedArtifact {
            payload,
            spec: ctx.spec(ArtifactType::Json)?,
        })
    }
}
