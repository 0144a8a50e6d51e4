//! Run configuration.
//!
//! Loaded from a RON file by the CLI, then overridden by flags. Unknown keys
//! are rejected at deserialization; ranges are checked by [`PipelineConfig::validate`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

pub const DEFAULT_CHUNK_BYTE_LIMIT: usize = 40_000;
pub const MAX_CHUNK_BYTE_LIMIT: usize = 1 << 30;
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 30_000;
pub const MAX_RENDER_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_WORKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum bytes per part, for every format.
    pub chunk_byte_limit: usize,
    pub overwrite: bool,
    /// Root under which `{domain}/{slug}/{type}` or `{slug}/{type}` directories are laid out.
    pub output_root: PathBuf,
    pub render_timeout_ms: u64,
    pub viewport: Viewport,
    /// Headless browser used for PDF output.
    pub pdf_command: String,
    /// Datasets processed concurrently by the batch runner.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_byte_limit: DEFAULT_CHUNK_BYTE_LIMIT,
            overwrite: false,
            output_root: PathBuf::from("output"),
            render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            viewport: Viewport::default(),
            pdf_command: "chromium".to_string(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.chunk_byte_limit == 0 || self.chunk_byte_limit > MAX_CHUNK_BYTE_LIMIT {
            return Err(PipelineError::invalid_input(format!(
                "chunk_byte_limit must be within 1..={MAX_CHUNK_BYTE_LIMIT}, got {}",
                self.chunk_byte_limit
            )));
        }
        if self.render_timeout_ms == 0 || self.render_timeout_ms > MAX_RENDER_TIMEOUT_MS {
            return Err(PipelineError::invalid_input(format!(
                "render_timeout_ms must be within 1..={MAX_RENDER_TIMEOUT_MS}, got {}",
                self.render_timeout_ms
            )));
        }
        if self.workers == 0 {
            return Err(PipelineError::invalid_input("workers must be at least 1"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(PipelineError::invalid_input("viewport dimensions must be positive"));
        }
        if self.pdf_command.trim().is_empty() {
            return Err(PipelineError::invalid_input("pdf_command must not be empty"));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(PipelineError::invalid_input("output_root must not be empty"));
        }
        Ok(())
    }
}
