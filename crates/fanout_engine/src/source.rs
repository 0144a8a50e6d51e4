use std::io;
use std::path::{Path, PathBuf};

use fanout_core::PipelineError;

use crate::fetch::FetchOutput;

const SOURCE_URL_PREFIX: &str = "<!-- Source URL:";

/// Raw input for one dataset, read fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub source_url: Option<String>,
}

impl SourceDocument {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl From<FetchOutput> for SourceDocument {
    fn from(output: FetchOutput) -> Self {
        Self {
            bytes: output.bytes,
            content_type: output.metadata.content_type,
            source_url: Some(output.metadata.final_url),
        }
    }
}

/// Where the orchestrator gets its source document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// A rendered export on disk; must exist.
    File {
        path: PathBuf,
        source_url: Option<String>,
    },
    /// Already in memory, e.g. a fetched page.
    Document(SourceDocument),
}

impl DatasetSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source_url: None,
        }
    }

    /// Resolve into a document. A missing or non-file path is invalid input.
    pub async fn load(&self) -> Result<SourceDocument, PipelineError> {
        match self {
            DatasetSource::Document(doc) => Ok(doc.clone()),
            DatasetSource::File { path, source_url } => {
                let bytes = match tokio::fs::read(path).await {
                    Ok(bytes) => bytes,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        return Err(PipelineError::invalid_input(format!(
                            "source path {path:?} does not exist"
                        )))
                    }
                    Err(err) if path.is_dir() => {
                        return Err(PipelineError::invalid_input(format!(
                            "source path {path:?} is a directory: {err}"
                        )))
                    }
                    Err(err) => return Err(PipelineError::io(path, err)),
                };
                let source_url = source_url
                    .clone()
                    .or_else(|| embedded_source_url(&bytes));
                Ok(SourceDocument {
                    content_type: content_type_for(path),
                    bytes,
                    source_url,
                })
            }
        }
    }
}

/// Reads a leading `<!-- Source URL: ... -->` marker left by an earlier run.
pub fn embedded_source_url(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(4096)];
    let text = String::from_utf8_lossy(head);
    let first = text.lines().next()?.trim();
    let url = first.strip_prefix(SOURCE_URL_PREFIX)?.strip_suffix("-->")?.trim();
    (!url.is_empty()).then(|| url.to_string())
}

/// The marker line written at the top of HTML artifacts.
pub fn source_url_comment(url: &str) -> String {
    format!("{SOURCE_URL_PREFIX} {url} -->")
}

fn content_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "html" | "htm" => Some("text/html".to_string()),
        "xhtml" => Some("application/xhtml+xml".to_string()),
        _ => None,
    }
}
