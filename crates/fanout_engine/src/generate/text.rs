use fanout_core::{ArtifactType, PipelineError};

use super::{require_upstream, utf8, FormatGenerator, GeneratedArtifact, GenerationContext};
use crate::frontmatter::strip_frontmatter;

/// Plain text derived from the Markdown aggregate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextGenerator;

#[async_trait::async_trait]
impl FormatGenerator for TextGenerator {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Text
    }

    async fn generate(
        &self,
        ctx: &GenerationContext,
        upstream: Option<&[u8]>,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let markdown = require_upstream(upstream, ArtifactType::Text, ArtifactType::Markdown)?;
        let markdown = utf8(markdown, ArtifactType::Markdown)?;
        Ok(GeneratedArtifact {
            payload: markdown_to_text(markdown).into_bytes(),
            spec: ctx.spec(ArtifactType::Text)?,
        })
    }
}

/// Drop frontmatter, HTML comments and Markdown markup, keeping readable text.
pub fn markdown_to_text(markdown: &str) -> String {
    let body = strip_comments(strip_frontmatter(markdown));
    let mut out = String::with_capacity(body.len());
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            out.push_str(line.trim_end());
            out.push('\n');
            continue;
        }
        if is_rule(trimmed) {
            out.push('\n');
            continue;
        }
        let line = trimmed.trim_start_matches('#').trim_start();
        let line = line.trim_start_matches('>').trim_start();
        let line = strip_inline(&strip_links(line));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    let mut text = out.trim_matches('\n').to_string();
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_rule(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|c| line.chars().all(|ch| ch == *c || ch == ' '))
}

/// `[label](target)` becomes `label`; `![alt](src)` becomes `alt`.
fn strip_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        let (before, after) = rest.split_at(open);
        let image = before.ends_with('!');
        out.push_str(if image { &before[..before.len() - 1] } else { before });
        if let Some(close) = after.find("](") {
            let label = &after[1..close];
            let tail = &after[close + 2..];
            if !label.contains('[') {
                if let Some(end) = tail.find(')') {
                    out.push_str(label);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }
        if image {
            out.push('!');
        }
        out.push('[');
        rest = &after[1..];
    }
    out.push_str(rest);
    out
}

/// Unwraps code spans verbatim and strips paired `**`/`*` emphasis elsewhere.
/// Underscores are left alone since the converter never emits them as markup.
fn strip_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('`') {
        let (before, after) = rest.split_at(open);
        out.push_str(&strip_emphasis(before));
        let ticks = after.len() - after.trim_start_matches('`').len();
        let fence = &after[..ticks];
        match after[ticks..].find(fence) {
            Some(close) => {
                out.push_str(&after[ticks..ticks + close]);
                rest = &after[ticks + close + ticks..];
            }
            None => {
                out.push_str(fence);
                rest = &after[ticks..];
            }
        }
    }
    out.push_str(&strip_emphasis(rest));
    out
}

fn strip_emphasis(text: &str) -> String {
    strip_paired(&strip_paired(text, "**"), "*")
}

/// Removes `delim` pairs whose opener is followed by, and whose closer is
/// preceded by, a non-space character. Lone delimiters stay.
fn strip_paired(text: &str, delim: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(delim) {
        let inner = open + delim.len();
        let opens = rest[inner..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != '*');
        if opens {
            if let Some(close) = closing_delimiter(&rest[inner..], delim) {
                out.push_str(&rest[..open]);
                out.push_str(&rest[inner..inner + close]);
                rest = &rest[inner + close + delim.len()..];
                continue;
            }
        }
        out.push_str(&rest[..inner]);
        rest = &rest[inner..];
    }
    out.push_str(rest);
    out
}

fn closing_delimiter(text: &str, delim: &str) -> Option<usize> {
    text.match_indices(delim)
        .map(|(index, _)| index)
        .find(|&index| {
            text[..index]
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_whitespace() && c != '*')
        })
}
