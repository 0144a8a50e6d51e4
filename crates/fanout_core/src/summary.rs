use std::collections::BTreeMap;

use crate::{ArtifactType, ChunkManifest, DatasetIdentity, ErrorKind, PipelineError};

/// Why a format failed, detached from the non-cloneable error value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for FormatFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub success: bool,
    pub manifest: Option<ChunkManifest>,
    pub error: Option<FormatFailure>,
}

impl FormatOutcome {
    pub fn succeeded(manifest: ChunkManifest) -> Self {
        Self {
            success: true,
            manifest: Some(manifest),
            error: None,
        }
    }

    pub fn failed(err: &PipelineError) -> Self {
        Self {
            success: false,
            manifest: None,
            error: Some(FormatFailure::from(err)),
        }
    }
}

/// Outcome of one orchestrator invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    identity: DatasetIdentity,
    per_format: BTreeMap<ArtifactType, FormatOutcome>,
}

impl RunSummary {
    pub fn new(identity: DatasetIdentity, per_format: BTreeMap<ArtifactType, FormatOutcome>) -> Self {
        Self {
            identity,
            per_format,
        }
    }

    pub fn identity(&self) -> &DatasetIdentity {
        &self.identity
    }

    pub fn outcome(&self, artifact_type: ArtifactType) -> Option<&FormatOutcome> {
        self.per_format.get(&artifact_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactType, &FormatOutcome)> {
        self.per_format.iter().map(|(ty, outcome)| (*ty, outcome))
    }

    /// True only if every recorded format succeeded.
    pub fn is_success(&self) -> bool {
        !self.per_format.is_empty() && self.per_format.values().all(|o| o.success)
    }

    pub fn failed_formats(&self) -> Vec<ArtifactType> {
        self.iter()
            .filter(|(_, outcome)| !outcome.success)
            .map(|(ty, _)| ty)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn manifest() -> ChunkManifest {
        ChunkManifest {
            total_parts: 1,
            part_paths: vec![PathBuf::from("a_html_part_01_of_01.html")],
            aggregate_path: PathBuf::from("a.html"),
        }
    }

    #[test]
    fn success_requires_every_format() {
        let identity = DatasetIdentity {
            slug: "a".into(),
            domain: None,
        };
        let mut per_format = BTreeMap::new();
        per_format.insert(ArtifactType::Html, FormatOutcome::succeeded(manifest()));
        assert!(RunSummary::new(identity.clone(), per_format.clone()).is_success());

        per_format.insert(
            ArtifactType::Pdf,
            FormatOutcome::failed(&PipelineError::RenderUnavailable("no chromium".into())),
        );
        let summary = RunSummary::new(identity, per_format);
        assert!(!summary.is_success());
        assert_eq!(summary.failed_formats(), vec![ArtifactType::Pdf]);
        let failure = summary.outcome(ArtifactType::Pdf).unwrap().error.clone().unwrap();
        assert_eq!(failure.kind, ErrorKind::RenderUnavailable);
    }
}
