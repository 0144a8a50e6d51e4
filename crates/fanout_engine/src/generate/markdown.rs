use std::sync::Arc;

use fanout_core::{ArtifactType, PipelineError};

use super::{require_upstream, utf8, FormatGenerator, GeneratedArtifact, GenerationContext};
use crate::convert::Converter;
use crate::extract::main_content;
use crate::frontmatter::{build_markdown_document, DocumentMeta};

/// Converts the HTML aggregate, never the raw source.
pub struct MarkdownGenerator {
    converter: Arc<dyn Converter>,
}

impl MarkdownGenerator {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self { converter }
    }
}

#[async_trait::async_trait]
impl FormatGenerator for MarkdownGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Markdown
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let html = require_upstream(upstream, ArtifactType::Markdown, ArtifactType::Html)?;
        let html = utf8(html, ArtifactType::Html)?;
        let content = main_content(html);
        let body = self.converter.to_markdown(&content.content_html);
        let dataset = ctx.identity.label();
        let meta = DocumentMeta {
            dataset: &dataset,
            source_url: ctx.source.source_url.as_deref(),
            title: content.title.as_deref(),
        };
        let (_, document) = build_markdown_document(&meta, &body);
        Ok(GeneratedArtifact {
            payload: document.into_bytes(),
            spec: ctx.spec(ArtifactType::Markdown)?,
        })
    }
}
