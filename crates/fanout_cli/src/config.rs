use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fanout_core::{PipelineConfig, PipelineError};
use fanout_logging::fanout_info;
use thiserror::Error;

use crate::cli::GlobalArgs;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error(transparent)]
    Invalid(#[from] PipelineError),
}

/// Defaults, then the RON file if given, then command-line overrides; validated.
pub fn resolve(args: &GlobalArgs) -> Result<PipelineConfig, ConfigError> {
    let base = match &args.config {
        Some(path) => load(path)?,
        None => PipelineConfig::default(),
    };
    let config = apply_overrides(base, args);
    config.validate()?;
    Ok(config)
}

pub fn load(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&text).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    fanout_info!("Loaded config from {:?}", path);
    Ok(config)
}

fn parse(text: &str) -> Result<PipelineConfig, String> {
    ron::from_str(text).map_err(|err| err.to_string())
}

fn apply_overrides(mut config: PipelineConfig, args: &GlobalArgs) -> PipelineConfig {
    if let Some(root) = &args.output_root {
        config.output_root = root.clone();
    }
    if let Some(limit) = args.chunk_bytes {
        config.chunk_byte_limit = limit;
    }
    if args.overwrite {
        config.overwrite = true;
    }
    if let Some(timeout) = args.render_timeout_ms {
        config.render_timeout_ms = timeout;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(command) = &args.pdf_command {
        config.pdf_command = command.clone();
    }
    config
}
