use fanout_core::{split, ArtifactSpec, ChunkManifest, PipelineError};
use fanout_logging::{fanout_debug, fanout_info};

use crate::output_dir::OutputDirectoryManager;
use crate::persist::StagedWrite;

/// Destination for generated payloads.
///
/// The orchestrator only talks to this trait, so tests can record payloads
/// in memory instead of touching the filesystem.
pub trait ArtifactSink: Send + Sync {
    fn write(
        &self,
        spec: &ArtifactSpec,
        payload: &[u8],
        max_bytes_per_part: usize,
        overwrite: bool,
    ) -> Result<ChunkManifest, PipelineError>;
}

/// Writes the aggregate plus every part for one artifact, all-or-nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactWriter {
    directories: OutputDirectoryManager,
}

impl ArtifactWriter {
    pub fn new(directories: OutputDirectoryManager) -> Self {
        Self { directories }
    }
}

impl ArtifactSink for ArtifactWriter {
    fn write(
        &self,
        spec: &ArtifactSpec,
        payload: &[u8],
        max_bytes_per_part: usize,
        overwrite: bool,
    ) -> Result<ChunkManifest, PipelineError> {
        let parts = split(payload, max_bytes_per_part)?;
        let total_parts = parts.len();
        let aggregate_path = spec.aggregate_path();
        let part_paths: Vec<_> = (1..=total_parts)
            .map(|index| spec.part_path(index, total_parts))
            .collect();

        let report = self.directories.prepare(
            &spec.destination_dir,
            &spec.base_name,
            spec.artifact_type,
            overwrite,
        )?;
        if !overwrite {
            // Targets first so the error names the file the caller asked for;
            // then any leftover part with a different total.
            let conflict = std::iter::once(&aggregate_path)
                .chain(part_paths.iter())
                .find(|path| path.exists())
                .cloned()
                .or_else(|| report.existing.first().cloned());
            if let Some(path) = conflict {
                return Err(PipelineError::FileConflict { path });
            }
        }

        let mut staged = StagedWrite::new(spec.destination_dir.clone())?;
        let aggregate_file = file_name(&aggregate_path)?;
        staged.stage(aggregate_file, payload)?;
        for (part, path) in parts.iter().zip(&part_paths) {
            staged.stage(file_name(path)?, part)?;
        }
        fanout_debug!(
            "Staged {} file(s) for {} {}",
            staged.len(),
            spec.base_name,
            spec.artifact_type
        );
        staged.commit(overwrite)?;

        fanout_info!(
            "Wrote {} aggregate {:?} ({} bytes) in {} part(s)",
            spec.artifact_type,
            aggregate_path,
            payload.len(),
            total_parts
        );
        Ok(ChunkManifest {
            total_parts,
            part_paths,
            aggregate_path,
        })
    }
}

fn file_name(path: &std::path::Path) -> Result<&str, PipelineError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PipelineError::invalid_input(format!("{path:?} has no valid UTF-8 file name"))
        })
}
