//! Per-dataset orchestration: prepare directories, run the task graph, write, summarize.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use fanout_core::{
    ArtifactType, DatasetIdentity, FormatOutcome, PipelineConfig, PipelineError, RunSummary,
    TaskGraph, DEFAULT_CHUNK_BYTE_LIMIT, MAX_CHUNK_BYTE_LIMIT,
};
use fanout_logging::{fanout_debug, fanout_info, fanout_warn};
use futures_util::future::join_all;

use crate::convert::Converter;
use crate::extract::ReadabilityLikeExtractor;
use crate::generate::{
    standard_generators, FormatGenerator, GeneratedArtifact, GenerationContext,
};
use crate::manifest::write_run_manifest;
use crate::output_dir::{OutputDirectoryManager, OutputDirs};
use crate::render::{PdfOptions, Renderer};
use crate::source::DatasetSource;
use crate::writer::{ArtifactSink, ArtifactWriter};

/// Per-invocation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub chunk_byte_limit: usize,
    pub overwrite: bool,
    pub pdf: PdfOptions,
}

impl RunOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            chunk_byte_limit: config.chunk_byte_limit,
            overwrite: config.overwrite,
            pdf: PdfOptions::from_config(config),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_byte_limit: DEFAULT_CHUNK_BYTE_LIMIT,
            overwrite: false,
            pdf: PdfOptions::default(),
        }
    }
}

pub struct PipelineOrchestrator {
    generators: BTreeMap<ArtifactType, Arc<dyn FormatGenerator>>,
    sink: Arc<dyn ArtifactSink>,
    directories: OutputDirectoryManager,
    graph: TaskGraph,
    write_manifest: bool,
}

impl PipelineOrchestrator {
    /// Later generators replace earlier ones for the same artifact type.
    pub fn new(generators: Vec<Arc<dyn FormatGenerator>>, sink: Arc<dyn ArtifactSink>) -> Self {
        let generators = generators
            .into_iter()
            .map(|generator| (generator.artifact_type(), generator))
            .collect();
        Self {
            generators,
            sink,
            directories: OutputDirectoryManager::new(),
            graph: TaskGraph::standard(),
            write_manifest: true,
        }
    }

    /// The five standard generators writing through [`ArtifactWriter`].
    pub fn standard(renderer: Arc<dyn Renderer>, converter: Arc<dyn Converter>) -> Self {
        let generators =
            standard_generators(renderer, converter, Arc::new(ReadabilityLikeExtractor));
        Self::new(generators, Arc::new(ArtifactWriter::default()))
    }

    pub fn with_graph(mut self, graph: TaskGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Skip writing `{base}.manifest.json`, e.g. when the sink is not the filesystem.
    pub fn without_run_manifest(mut self) -> Self {
        self.write_manifest = false;
        self
    }

    /// Run every generator for one dataset.
    ///
    /// Format failures are recorded in the summary; only invocation misuse
    /// (bad chunk limit, missing source, unconfigured output directory or
    /// generator) is returned as an error.
    pub async fn generate_all(
        &self,
        identity: &DatasetIdentity,
        source: &DatasetSource,
        output_dirs: &OutputDirs,
        options: &RunOptions,
    ) -> Result<RunSummary, PipelineError> {
        if options.chunk_byte_limit == 0 || options.chunk_byte_limit > MAX_CHUNK_BYTE_LIMIT {
            return Err(PipelineError::invalid_input(format!(
                "chunk byte limit must be within 1..={MAX_CHUNK_BYTE_LIMIT}, got {}",
                options.chunk_byte_limit
            )));
        }
        for ty in self.graph.nodes() {
            output_dirs.dir(*ty)?;
            if !self.generators.contains_key(ty) {
                return Err(PipelineError::invalid_input(format!(
                    "no generator registered for {ty}"
                )));
            }
        }
        let document = source.load().await?;
        let base_name = identity.slug.clone();
        fanout_info!(
            "Generating artifacts for {} ({} source bytes)",
            identity.label(),
            document.bytes.len()
        );

        let mut prepare_failures = BTreeMap::new();
        for ty in self.graph.nodes() {
            let dir = output_dirs.dir(*ty)?;
            if let Err(err) = self
                .directories
                .prepare(dir, &base_name, *ty, options.overwrite)
            {
                fanout_warn!("Could not prepare {:?} for {}: {}", dir, ty, err);
                prepare_failures.insert(*ty, FormatOutcome::failed(&err));
            }
        }

        let ctx = GenerationContext {
            identity: identity.clone(),
            base_name: base_name.clone(),
            source: document,
            output_dirs: output_dirs.clone(),
            pdf: options.pdf,
        };
        let branches = self.graph.branches();
        let results = join_all(
            branches
                .iter()
                .map(|branch| self.run_branch(branch, &ctx, options, &prepare_failures)),
        )
        .await;
        let per_format: BTreeMap<_, _> = results.into_iter().flatten().collect();
        let summary = RunSummary::new(identity.clone(), per_format);

        for (ty, outcome) in summary.iter() {
            match &outcome.error {
                Some(failure) => fanout_warn!("{} {} failed: {}", identity.label(), ty, failure.message),
                None => fanout_debug!("{} {} succeeded", identity.label(), ty),
            }
        }

        if self.write_manifest {
            if let Err(err) =
                write_run_manifest(&summary, output_dirs.dataset_root(), &base_name, options.overwrite)
            {
                fanout_warn!("Run manifest for {} not written: {}", identity.label(), err);
            }
        }
        Ok(summary)
    }

    /// Run one chain in order, feeding each successful aggregate forward.
    async fn run_branch(
        &self,
        branch: &[ArtifactType],
        ctx: &GenerationContext,
        options: &RunOptions,
        prepare_failures: &BTreeMap<ArtifactType, FormatOutcome>,
    ) -> Vec<(ArtifactType, FormatOutcome)> {
        let mut outcomes = Vec::with_capacity(branch.len());
        let mut upstream: Option<Vec<u8>> = None;
        for ty in branch {
            if let Some(failed) = prepare_failures.get(ty) {
                outcomes.push((*ty, failed.clone()));
                upstream = None;
                continue;
            }
            let (outcome, payload) = self.run_node(*ty, ctx, upstream.as_deref(), options).await;
            outcomes.push((*ty, outcome));
            upstream = payload;
        }
        outcomes
    }

    async fn run_node(
        &self,
        ty: ArtifactType,
        ctx: &GenerationContext,
        upstream: Option<&[u8]>,
        options: &RunOptions,
    ) -> (FormatOutcome, Option<Vec<u8>>) {
        let Some(generator) = self.generators.get(&ty) else {
            let err = PipelineError::invalid_input(format!("no generator registered for {ty}"));
            return (FormatOutcome::failed(&err), None);
        };
        let artifact = match generator.generate(ctx, upstream).await {
            Ok(artifact) => artifact,
            Err(err) => return (FormatOutcome::failed(&err), None),
        };
        // Sink writes fsync every part; keep them off the async workers.
        let GeneratedArtifact { payload, spec } = artifact;
        let destination = spec.destination_dir.clone();
        let sink = Arc::clone(&self.sink);
        let (limit, overwrite) = (options.chunk_byte_limit, options.overwrite);
        let written = tokio::task::spawn_blocking(move || {
            let result = sink.write(&spec, &payload, limit, overwrite);
            (result, payload)
        })
        .await;
        match written {
            Ok((Ok(manifest), payload)) => (FormatOutcome::succeeded(manifest), Some(payload)),
            Ok((Err(err), _)) => (FormatOutcome::failed(&err), None),
            Err(join) => {
                let err = PipelineError::io(destination, io::Error::other(join.to_string()));
                (FormatOutcome::failed(&err), None)
            }
        }
    }
}
