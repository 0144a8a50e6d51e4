//! Bounded-concurrency processing of many datasets.

use std::path::PathBuf;
use std::sync::Arc;

use fanout_core::{assign, DatasetIdentity, PipelineError, RunSummary};
use fanout_logging::{fanout_info, fanout_warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{collect_domain_pages, compose_aggregate_html};
use crate::fetch::Fetcher;
use crate::output_dir::OutputDirs;
use crate::pipeline::{PipelineOrchestrator, RunOptions};
use crate::source::{DatasetSource, SourceDocument};

/// One dataset to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchJob {
    /// Rendered export already on disk or in memory.
    Export {
        identity: DatasetIdentity,
        source: DatasetSource,
    },
    /// Page to fetch; identity comes from the URL.
    Url(String),
}

impl BatchJob {
    pub fn label(&self) -> String {
        match self {
            BatchJob::Export { identity, .. } => identity.label(),
            BatchJob::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug)]
pub enum DatasetOutcome {
    Completed(RunSummary),
    /// The dataset never reached per-format generation.
    Failed(PipelineError),
    /// Cancellation was requested before the dataset started.
    Cancelled,
}

#[derive(Debug)]
pub struct DatasetReport {
    pub label: String,
    pub identity: Option<DatasetIdentity>,
    pub outcome: DatasetOutcome,
}

impl DatasetReport {
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, DatasetOutcome::Completed(summary) if summary.is_success())
    }
}

pub struct BatchRunner {
    orchestrator: Arc<PipelineOrchestrator>,
    fetcher: Arc<dyn Fetcher>,
    output_root: PathBuf,
    options: RunOptions,
    workers: usize,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        fetcher: Arc<dyn Fetcher>,
        output_root: impl Into<PathBuf>,
        options: RunOptions,
        workers: usize,
    ) -> Self {
        Self {
            orchestrator,
            fetcher,
            output_root: output_root.into(),
            options,
            workers: workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the batch at the next dataset boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process every job with at most `workers` in flight. Reports come back
    /// in job order; datasets themselves may finish in any order.
    pub async fn run(&self, jobs: Vec<BatchJob>) -> Vec<DatasetReport> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        fanout_info!("Processing {} dataset(s) with {} worker(s)", jobs.len(), self.workers);

        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let label = job.label();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let orchestrator = self.orchestrator.clone();
            let fetcher = self.fetcher.clone();
            let output_root = self.output_root.clone();
            let options = self.options;
            let handle = tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit.filter(|_| !cancel.is_cancelled()) else {
                    return DatasetReport {
                        label: job.label(),
                        identity: None,
                        outcome: DatasetOutcome::Cancelled,
                    };
                };
                process(job, &orchestrator, fetcher.as_ref(), &output_root, &options).await
            });
            handles.push((label, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (label, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(err) => DatasetReport {
                    label,
                    identity: None,
                    outcome: DatasetOutcome::Failed(PipelineError::invalid_input(format!(
                        "dataset task aborted: {err}"
                    ))),
                },
            };
            reports.push(report);
        }
        reports
    }

    /// Combine each domain's successfully rendered pages into one more
    /// dataset, `{domain}/_aggregate`, run through the same pipeline.
    pub async fn aggregate_domains(&self, reports: &[DatasetReport]) -> Vec<DatasetReport> {
        let mut aggregates = Vec::new();
        for (domain, pages) in collect_domain_pages(reports).await {
            let identity = DatasetIdentity::domain_aggregate(&domain);
            let label = identity.label();
            if self.cancel.is_cancelled() {
                aggregates.push(DatasetReport {
                    label,
                    identity: Some(identity),
                    outcome: DatasetOutcome::Cancelled,
                });
                continue;
            }
            fanout_info!("Aggregating {} page(s) for {}", pages.len(), domain);
            let document = SourceDocument::new(compose_aggregate_html(&domain, &pages))
                .with_source_url(format!("domain://{domain}"))
                .with_content_type("text/html; charset=utf-8");
            let output_dirs = OutputDirs::layout(&self.output_root, &identity);
            let outcome = match self
                .orchestrator
                .generate_all(
                    &identity,
                    &DatasetSource::Document(document),
                    &output_dirs,
                    &self.options,
                )
                .await
            {
                Ok(summary) => DatasetOutcome::Completed(summary),
                Err(err) => {
                    fanout_warn!("Aggregate {} rejected: {}", label, err);
                    DatasetOutcome::Failed(err)
                }
            };
            aggregates.push(DatasetReport {
                label,
                identity: Some(identity),
                outcome,
            });
        }
        aggregates
    }
}

async fn process(
    job: BatchJob,
    orchestrator: &PipelineOrchestrator,
    fetcher: &dyn Fetcher,
    output_root: &std::path::Path,
    options: &RunOptions,
) -> DatasetReport {
    let label = job.label();
    let (identity, source) = match resolve(job, fetcher).await {
        Ok(resolved) => resolved,
        Err((identity, err)) => {
            fanout_warn!("Dataset {} failed before generation: {}", label, err);
            return DatasetReport {
                label,
                identity,
                outcome: DatasetOutcome::Failed(err),
            };
        }
    };
    let output_dirs = OutputDirs::layout(output_root, &identity);
    let outcome = match orchestrator
        .generate_all(&identity, &source, &output_dirs, options)
        .await
    {
        Ok(summary) => DatasetOutcome::Completed(summary),
        Err(err) => {
            fanout_warn!("Dataset {} rejected: {}", label, err);
            DatasetOutcome::Failed(err)
        }
    };
    DatasetReport {
        label,
        identity: Some(identity),
        outcome,
    }
}

type Resolved = (DatasetIdentity, DatasetSource);

async fn resolve(
    job: BatchJob,
    fetcher: &dyn Fetcher,
) -> Result<Resolved, (Option<DatasetIdentity>, PipelineError)> {
    match job {
        BatchJob::Export { identity, source } => Ok((identity, source)),
        BatchJob::Url(url) => {
            let identity = assign(&url).map_err(|err| (None, err))?;
            let fetched = fetcher
                .fetch(&url)
                .await
                .map_err(|err| (Some(identity.clone()), PipelineError::from(err)))?;
            let document = SourceDocument::from(fetched).with_source_url(url);
            Ok((identity, DatasetSource::Document(document)))
        }
    }
}
