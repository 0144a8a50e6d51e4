//! Run manifests: a JSON record of every file one dataset run produced,
//! with sizes and SHA-256 digests, and a verifier for it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use fanout_core::{ArtifactType, ErrorKind, PipelineError, RunSummary};
use fanout_logging::{fanout_info, fanout_warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::persist::AtomicFileWriter;

pub const MANIFEST_SUFFIX: &str = ".manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Relative to the manifest's directory, `/`-separated.
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRecord {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<FileRecord>,
    #[serde(default)]
    pub parts: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub formats: BTreeMap<ArtifactType, FormatRecord>,
}

impl RunManifest {
    /// Hash every file named in `summary`; paths are stored relative to `dataset_root`.
    pub fn from_summary(summary: &RunSummary, dataset_root: &Path) -> Result<Self, PipelineError> {
        let mut formats = BTreeMap::new();
        for (ty, outcome) in summary.iter() {
            let mut record = FormatRecord {
                success: outcome.success,
                error: outcome.error.as_ref().map(|failure| ErrorRecord {
                    kind: failure.kind,
                    message: failure.message.clone(),
                }),
                aggregate: None,
                parts: Vec::new(),
            };
            if let Some(manifest) = &outcome.manifest {
                record.aggregate = Some(file_record(&manifest.aggregate_path, dataset_root)?);
                record.parts = manifest
                    .part_paths
                    .iter()
                    .map(|path| file_record(path, dataset_root))
                    .collect::<Result<_, _>>()?;
            }
            formats.insert(ty, record);
        }
        let identity = summary.identity();
        Ok(Self {
            dataset: identity.slug.clone(),
            domain: identity.domain.clone(),
            formats,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.formats
            .values()
            .flat_map(|record| record.aggregate.iter().chain(record.parts.iter()))
    }
}

/// `{base_name}.manifest.json`
pub fn manifest_file_name(base_name: &str) -> String {
    format!("{base_name}{MANIFEST_SUFFIX}")
}

/// Write the manifest for `summary` into `dataset_root`.
///
/// An existing manifest is only replaced when `overwrite` is set.
pub fn write_run_manifest(
    summary: &RunSummary,
    dataset_root: &Path,
    base_name: &str,
    overwrite: bool,
) -> Result<PathBuf, PipelineError> {
    let manifest = RunManifest::from_summary(summary, dataset_root)?;
    let mut json = serde_json::to_vec_pretty(&manifest)
        .map_err(|err| PipelineError::serialization(err.to_string()))?;
    json.push(b'\n');
    let name = manifest_file_name(base_name);
    let path = AtomicFileWriter::new(dataset_root.to_path_buf())
        .replace(overwrite)
        .write(&name, &json)
        .map_err(PipelineError::from)?;
    fanout_info!("Wrote run manifest {:?}", path);
    Ok(path)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked: usize,
    pub missing: Vec<PathBuf>,
    pub mismatched: Vec<PathBuf>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty()
    }
}

/// Re-hash every file a manifest lists, relative to the manifest's directory.
pub fn verify_run_manifest(manifest_path: &Path) -> Result<VerifyReport, PipelineError> {
    let raw = match fs::read(manifest_path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(PipelineError::invalid_input(format!(
                "manifest {manifest_path:?} does not exist"
            )))
        }
        Err(err) => return Err(PipelineError::io(manifest_path, err)),
    };
    let manifest: RunManifest = serde_json::from_slice(&raw).map_err(|err| {
        PipelineError::serialization(format!("{manifest_path:?} is not a run manifest: {err}"))
    })?;
    let root = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut report = VerifyReport::default();
    for record in manifest.files() {
        report.checked += 1;
        let path = resolve(root, &record.path)?;
        match fs::read(&path) {
            Ok(bytes) => {
                if bytes.len() as u64 != record.bytes || sha256_hex(&bytes) != record.sha256 {
                    fanout_warn!("Checksum mismatch for {:?}", path);
                    report.mismatched.push(path);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fanout_warn!("Missing file {:?}", path);
                report.missing.push(path);
            }
            Err(err) => return Err(PipelineError::io(path, err)),
        }
    }
    Ok(report)
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn file_record(path: &Path, dataset_root: &Path) -> Result<FileRecord, PipelineError> {
    let bytes = fs::read(path).map_err(|err| PipelineError::io(path, err))?;
    let relative = match path.strip_prefix(dataset_root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    };
    Ok(FileRecord {
        path: relative,
        bytes: bytes.len() as u64,
        sha256: sha256_hex(&bytes),
    })
}

/// Relative entries must stay below the manifest's directory. Absolute
/// entries come from output directories outside the dataset root.
fn resolve(root: &Path, relative: &str) -> Result<PathBuf, PipelineError> {
    let candidate = Path::new(relative);
    if candidate.components().any(|c| c == Component::ParentDir) {
        return Err(PipelineError::invalid_input(format!(
            "manifest entry `{relative}` escapes the dataset directory"
        )));
    }
    Ok(root.join(candidate))
}
