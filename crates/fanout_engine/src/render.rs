//! Rendering collaborators: source bytes to HTML, HTML to PDF.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use fanout_core::{PipelineConfig, PipelineError, Viewport, DEFAULT_RENDER_TIMEOUT_MS};
use fanout_logging::{fanout_debug, fanout_warn};
use tokio::process::Command;

use crate::decode::decode_html;
use crate::source::SourceDocument;

const PAGE_FILE: &str = "page.html";
const PDF_FILE: &str = "page.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfOptions {
    pub timeout_ms: u64,
    pub viewport: Viewport,
}

impl PdfOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            timeout_ms: config.render_timeout_ms,
            viewport: config.viewport,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            viewport: Viewport::default(),
        }
    }
}

#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Produce a UTF-8 HTML document for the source.
    async fn render_to_html(&self, source: &SourceDocument) -> Result<Vec<u8>, PipelineError>;

    async fn render_to_pdf(&self, html: &[u8], options: &PdfOptions)
        -> Result<Vec<u8>, PipelineError>;
}

/// Decodes sources without hydration and prints PDFs through a headless
/// Chromium-compatible browser.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    pdf_command: String,
}

impl HeadlessRenderer {
    pub fn new(pdf_command: impl Into<String>) -> Self {
        Self {
            pdf_command: pdf_command.into(),
        }
    }

    pub fn pdf_command(&self) -> &str {
        &self.pdf_command
    }

    fn command(&self, page: &Path, pdf: &Path, viewport: Viewport) -> Result<Command, PipelineError> {
        let page_url = url::Url::from_file_path(page).map_err(|()| {
            PipelineError::RenderUnavailable(format!("{page:?} cannot be expressed as a file url"))
        })?;
        let mut command = Command::new(&self.pdf_command);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--window-size={},{}", viewport.width, viewport.height))
            .arg(format!("--print-to-pdf={}", pdf.display()))
            .arg(page_url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(PipelineConfig::default().pdf_command)
    }
}

#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn render_to_html(&self, source: &SourceDocument) -> Result<Vec<u8>, PipelineError> {
        let decoded = decode_html(&source.bytes, source.content_type.as_deref())?;
        fanout_debug!(
            "Decoded {} source bytes as {}",
            source.bytes.len(),
            decoded.encoding_label
        );
        Ok(decoded.html.into_bytes())
    }

    async fn render_to_pdf(
        &self,
        html: &[u8],
        options: &PdfOptions,
    ) -> Result<Vec<u8>, PipelineError> {
        let workdir = tempfile::tempdir().map_err(|err| PipelineError::io(std::env::temp_dir(), err))?;
        let page = workdir.path().join(PAGE_FILE);
        let pdf = workdir.path().join(PDF_FILE);
        tokio::fs::write(&page, html)
            .await
            .map_err(|err| PipelineError::io(&page, err))?;

        let mut command = self.command(&page, &pdf, options.viewport)?;
        let output = command.output();
        let output = match tokio::time::timeout(Duration::from_millis(options.timeout_ms), output).await
        {
            Err(_) => {
                // Dropping the future kills the child.
                fanout_warn!(
                    "{} did not finish within {} ms",
                    self.pdf_command,
                    options.timeout_ms
                );
                return Err(PipelineError::RenderTimeout {
                    timeout_ms: options.timeout_ms,
                });
            }
            Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PipelineError::RenderUnavailable(format!(
                    "`{}` not found",
                    self.pdf_command
                )));
            }
            Ok(Err(err)) => {
                return Err(PipelineError::RenderUnavailable(format!(
                    "could not run `{}`: {err}",
                    self.pdf_command
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::RenderUnavailable(format!(
                "`{}` exited with {}: {}",
                self.pdf_command,
                output.status,
                stderr.trim()
            )));
        }

        let bytes = match tokio::fs::read(&pdf).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(PipelineError::io(&pdf, err)),
        };
        if bytes.is_empty() {
            return Err(PipelineError::RenderUnavailable(format!(
                "`{}` produced no PDF output",
                self.pdf_command
            )));
        }
        fanout_debug!("Rendered {} PDF bytes", bytes.len());
        Ok(bytes)
    }
}
