use std::sync::Arc;

use fanout_core::{ArtifactType, PipelineError};
use fanout_logging::fanout_debug;

use super::{FormatGenerator, GeneratedArtifact, GenerationContext};
use crate::render::Renderer;

pub struct PdfGenerator {
    renderer: Arc<dyn Renderer>,
}

impl PdfGenerator {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait::async_trait]
impl FormatGenerator for PdfGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Pdf
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        _upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let html = self.renderer.render_to_html(&ctx.source).await?;
        fanout_debug!(
            "Printing {} to PDF ({} ms budget)",
            ctx.identity.label(),
            ctx.pdf.timeout_ms
        );
        let payload = self.renderer.render_to_pdf(&html, &ctx.pdf).await?;
        Ok(GeneratedArtifact {
            payload,
            spec: ctx.spec(ArtifactType::Pdf)?,
        })
    }
}
