#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use fanout_core::PipelineError;
use fanout_engine::{Converter, PdfOptions, Renderer, SourceDocument};

/// Echoes UTF-8 sources as HTML and "prints" a deterministic fake PDF.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    pub fail_html: bool,
    pub pdf_timeout: bool,
    pub pdf_calls: AtomicUsize,
}

impl FakeRenderer {
    pub fn failing_html() -> Self {
        Self {
            fail_html: true,
            ..Self::default()
        }
    }

    pub fn timing_out_pdf() -> Self {
        Self {
            pdf_timeout: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn render_to_html(&self, source: &SourceDocument) -> Result<Vec<u8>, PipelineError> {
        if self.fail_html {
            return Err(PipelineError::RenderUnavailable("fake html failure".into()));
        }
        Ok(source.bytes.clone())
    }

    async fn render_to_pdf(
        &self,
        html: &[u8],
        options: &PdfOptions,
    ) -> Result<Vec<u8>, PipelineError> {
        self.pdf_calls.fetch_add(1, Ordering::SeqCst);
        if self.pdf_timeout {
            return Err(PipelineError::RenderTimeout {
                timeout_ms: options.timeout_ms,
            });
        }
        let mut pdf = format!(
            "%PDF-1.4 fake {}x{}\n",
            options.viewport.width, options.viewport.height
        )
        .into_bytes();
        pdf.extend_from_slice(html);
        Ok(pdf)
    }
}

/// Strips tags; good enough to prove the Markdown step ran.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeConverter;

impl Converter for FakeConverter {
    fn to_markdown(&self, html: &str) -> String {
        let mut out = String::new();
        let mut in_tag = false;
        for ch in html.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => out.push(ch),
                _ => {}
            }
        }
        format!("# Converted\n\n{}\n", out.trim())
    }
}

/// Relative path → bytes for every file below `root`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(relative, fs::read(&path).unwrap());
        }
    }
}

/// File names in `dir`, sorted. A directory that was never created has none.
pub fn names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn sample_html(paragraphs: usize) -> String {
    let mut html = String::from(
        "<html><head><title>Sample page</title></head><body><article><h1>Sample</h1>",
    );
    for i in 0..paragraphs {
        html.push_str(&format!(
            "<p>Paragraph {i} with a <a href=\"https://example.com/{i}\">link</a>.</p>"
        ));
    }
    html.push_str("</article></body></html>");
    html
}
