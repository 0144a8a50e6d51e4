use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fanout_core::{aggregate_name, parse_part_name, ArtifactType, DatasetIdentity, PipelineError};
use fanout_logging::{fanout_debug, fanout_info};

use crate::persist::ensure_output_dir;

/// Destination directory per artifact type for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    dataset_root: PathBuf,
    per_type: BTreeMap<ArtifactType, PathBuf>,
}

impl OutputDirs {
    /// `{root}/{domain}/{slug}/{type}` for URL datasets, `{root}/{slug}/{type}` otherwise.
    pub fn layout(output_root: &Path, identity: &DatasetIdentity) -> Self {
        let dataset_root = output_root.join(identity.relative_dir());
        let per_type = ArtifactType::ALL
            .into_iter()
            .map(|ty| (ty, dataset_root.join(ty.label())))
            .collect();
        Self {
            dataset_root,
            per_type,
        }
    }

    /// Explicit directories; types left out make a run fail with `InvalidInput`.
    pub fn new(dataset_root: impl Into<PathBuf>, per_type: BTreeMap<ArtifactType, PathBuf>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            per_type,
        }
    }

    /// Where the run manifest goes.
    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    pub fn dir(&self, artifact_type: ArtifactType) -> Result<&Path, PipelineError> {
        self.per_type
            .get(&artifact_type)
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("no output directory configured for {artifact_type}"))
            })
    }
}

/// What [`OutputDirectoryManager::prepare`] found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareReport {
    /// Files deleted because overwrite was requested.
    pub removed: Vec<PathBuf>,
    /// Matching files left in place because overwrite was not requested.
    pub existing: Vec<PathBuf>,
}

impl PrepareReport {
    pub fn has_conflicts(&self) -> bool {
        !self.existing.is_empty()
    }
}

/// Cleans destination directories so no mixture of old and new chunk
/// boundaries can coexist.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputDirectoryManager;

impl OutputDirectoryManager {
    pub fn new() -> Self {
        Self
    }

    /// With `overwrite`, delete the aggregate and every part (any total) for
    /// `(base_name, artifact_type)`; without it, only report what exists.
    ///
    /// Running it twice in a row has the same effect as running it once.
    pub fn prepare(
        &self,
        destination_dir: &Path,
        base_name: &str,
        artifact_type: ArtifactType,
        overwrite: bool,
    ) -> Result<PrepareReport, PipelineError> {
        if !overwrite {
            let existing = self.matching_files(destination_dir, base_name, artifact_type)?;
            return Ok(PrepareReport {
                removed: Vec::new(),
                existing,
            });
        }

        ensure_output_dir(destination_dir)?;
        let mut removed = Vec::new();
        for path in self.matching_files(destination_dir, base_name, artifact_type)? {
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(PipelineError::io(path, err)),
            }
        }
        if !removed.is_empty() {
            fanout_info!(
                "Removed {} stale {} file(s) for {} in {:?}",
                removed.len(),
                artifact_type,
                base_name,
                destination_dir
            );
        }
        Ok(PrepareReport {
            removed,
            existing: Vec::new(),
        })
    }

    /// Aggregate and part files for `(base_name, artifact_type)`, sorted by name.
    /// A missing directory has no matches.
    pub fn matching_files(
        &self,
        destination_dir: &Path,
        base_name: &str,
        artifact_type: ArtifactType,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let entries = match fs::read_dir(destination_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PipelineError::io(destination_dir, err)),
        };

        let extension = artifact_type.extension();
        let aggregate = aggregate_name(base_name, extension);
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name == aggregate
                    || parse_part_name(&name, base_name, artifact_type, extension).is_some()
            })
            .map(|e| e.path())
            .collect();
        matches.sort();
        fanout_debug!(
            "{} existing {} file(s) for {} in {:?}",
            matches.len(),
            artifact_type,
            base_name,
            destination_dir
        );
        Ok(matches)
    }
}
