use std::sync::Arc;

use fanout_core::{ArtifactType, PipelineError};

use super::{FormatGenerator, GeneratedArtifact, GenerationContext};
use crate::render::Renderer;
use crate::source::{embedded_source_url, source_url_comment};

pub struct HtmlGenerator {
    renderer: Arc<dyn Renderer>,
}

impl HtmlGenerator {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait::async_trait]
impl FormatGenerator for HtmlGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Html
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        _upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let html = self.renderer.render_to_html(&ctx.source).await?;
        let payload = match ctx.source.source_url.as_deref() {
            Some(url) if embedded_source_url(&html).is_none() => {
                let mut payload = source_url_comment(url).into_bytes();
                payload.push(b'\n');
                payload.extend_from_slice(&html);
                payload
            }
            _ => html,
        };
        Ok(GeneratedArtifact {
            payload,
            spec: ctx.spec(ArtifactType::Html)?,
        })
    }
}
