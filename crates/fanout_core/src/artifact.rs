use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chunk::{aggregate_name, part_name};
use crate::PipelineError;

/// One producible representation of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Html,
    Markdown,
    Text,
    Json,
    Pdf,
}

impl ArtifactType {
    /// Every artifact type, in summary display order.
    pub const ALL: [ArtifactType; 5] = [
        ArtifactType::Html,
        ArtifactType::Markdown,
        ArtifactType::Text,
        ArtifactType::Json,
        ArtifactType::Pdf,
    ];

    /// Label embedded in part file names and used as the per-type directory name.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactType::Html => "html",
            ArtifactType::Markdown => "markdown",
            ArtifactType::Text => "text",
            ArtifactType::Json => "json",
            ArtifactType::Pdf => "pdf",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactType::Html => ".html",
            ArtifactType::Markdown => ".md",
            ArtifactType::Text => ".txt",
            ArtifactType::Json => ".json",
            ArtifactType::Pdf => ".pdf",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArtifactType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactType::ALL
            .into_iter()
            .find(|ty| ty.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::invalid_input(format!("unknown artifact type `{s}`")))
    }
}

/// Identifies one artifact to be written: where, under which base name, in which format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub artifact_type: ArtifactType,
    pub base_name: String,
    pub extension: String,
    pub destination_dir: PathBuf,
}

impl ArtifactSpec {
    pub fn new(
        artifact_type: ArtifactType,
        base_name: impl Into<String>,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            artifact_type,
            base_name: base_name.into(),
            extension: artifact_type.extension().to_string(),
            destination_dir: destination_dir.into(),
        }
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.destination_dir
            .join(aggregate_name(&self.base_name, &self.extension))
    }

    pub fn part_path(&self, index: usize, total: usize) -> PathBuf {
        self.destination_dir.join(part_name(
            &self.base_name,
            self.artifact_type,
            index,
            total,
            &self.extension,
        ))
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }
}

/// What was written for one artifact.
///
/// `part_paths[i - 1]` holds part `i`; `part_paths.len() == total_parts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkManifest {
    pub total_parts: usize,
    pub part_paths: Vec<PathBuf>,
    pub aggregate_path: PathBuf,
}

impl ChunkManifest {
    /// Every path in the manifest, aggregate first.
    pub fn all_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.aggregate_path.as_path())
            .chain(self.part_paths.iter().map(PathBuf::as_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_extensions_are_fixed() {
        let pairs: Vec<_> = ArtifactType::ALL
            .iter()
            .map(|ty| (ty.label(), ty.extension()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("html", ".html"),
                ("markdown", ".md"),
                ("text", ".txt"),
                ("json", ".json"),
                ("pdf", ".pdf"),
            ]
        );
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("Markdown".parse::<ArtifactType>().unwrap(), ArtifactType::Markdown);
        assert!("docx".parse::<ArtifactType>().is_err());
    }

    #[test]
    fn spec_paths_follow_naming_contract() {
        let spec = ArtifactSpec::new(ArtifactType::Text, "chat", "/out/text");
        assert_eq!(spec.aggregate_path(), PathBuf::from("/out/text/chat.txt"));
        assert_eq!(
            spec.part_path(2, 7),
            PathBuf::from("/out/text/chat_text_part_02_of_07.txt")
        );
    }
}
