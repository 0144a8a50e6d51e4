mod common;

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use fanout_core::{assign, ArtifactType, DatasetIdentity, ErrorKind};
use fanout_engine::{
    BatchJob, BatchRunner, DatasetOutcome, DatasetSource, FetchError, FetchFailure,
    FetchMetadata, FetchOutput, Fetcher, PipelineOrchestrator, RunOptions,
};
use tempfile::TempDir;

use common::{sample_html, FakeConverter, FakeRenderer};

/// Serves canned pages; anything else is a 404.
struct CannedFetcher {
    pages: HashMap<String, String>,
}

#[async_trait::async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let Some(body) = self.pages.get(url) else {
            return Err(FetchError {
                kind: FetchFailure::HttpStatus(404),
                message: "404 Not Found".into(),
            });
        };
        Ok(FetchOutput {
            bytes: body.clone().into_bytes(),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: Some("text/html".into()),
                byte_len: body.len() as u64,
            },
        })
    }
}

fn runner(temp: &TempDir, pages: &[&str], workers: usize) -> BatchRunner {
    let pages = pages
        .iter()
        .map(|url| (url.to_string(), sample_html(5)))
        .collect();
    let orchestrator = Arc::new(PipelineOrchestrator::standard(
        Arc::new(FakeRenderer::default()),
        Arc::new(FakeConverter),
    ));
    BatchRunner::new(
        orchestrator,
        Arc::new(CannedFetcher { pages }),
        temp.path(),
        RunOptions::default(),
        workers,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn processes_urls_and_exports_into_their_layouts() {
    let temp = TempDir::new().unwrap();
    let a = "https://example.com/a";
    let b = "https://blog.example.com/posts/b?page=2";
    let export_path = temp.path().join("export.html");
    fs::write(&export_path, sample_html(3)).unwrap();

    let jobs = vec![
        BatchJob::Url(a.into()),
        BatchJob::Url(b.into()),
        BatchJob::Url("https://example.com/missing".into()),
        BatchJob::Url("::not a url::".into()),
        BatchJob::Export {
            identity: DatasetIdentity::from_export_id("chat-7").unwrap(),
            source: DatasetSource::file(&export_path),
        },
    ];
    let reports = runner(&temp, &[a, b], 2).run(jobs).await;
    assert_eq!(reports.len(), 5);

    assert!(reports[0].is_success());
    assert!(reports[1].is_success());
    assert!(reports[4].is_success());
    let a_identity = assign(a).unwrap();
    assert_eq!(reports[0].identity.as_ref(), Some(&a_identity));
    assert!(temp
        .path()
        .join("example.com")
        .join(&a_identity.slug)
        .join("html")
        .is_dir());
    assert!(temp.path().join("chat-7").join("pdf").is_dir());

    match &reports[2].outcome {
        DatasetOutcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::Fetch),
        other => panic!("expected fetch failure, got {other:?}"),
    }
    match &reports[3].outcome {
        DatasetOutcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::InvalidInput),
        other => panic!("expected invalid input, got {other:?}"),
    }
    assert!(reports[3].identity.is_none());
}

#[tokio::test]
async fn cancelled_batch_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let a = "https://example.com/a";
    let runner = runner(&temp, &[a], 1);
    runner.cancellation_token().cancel();

    let reports = runner.run(vec![BatchJob::Url(a.into())]).await;
    assert!(matches!(reports[0].outcome, DatasetOutcome::Cancelled));
    assert!(!reports[0].is_success());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn successful_pages_are_aggregated_per_domain() {
    let temp = TempDir::new().unwrap();
    let a = "https://example.com/a";
    let b = "https://blog.example.com/posts/b";
    let c = "https://other.org/c";
    let export_path = temp.path().join("export.html");
    fs::write(&export_path, sample_html(3)).unwrap();
    let runner = runner(&temp, &[a, b, c], 2);

    let reports = runner
        .run(vec![
            BatchJob::Url(b.into()),
            BatchJob::Url(a.into()),
            BatchJob::Url("https://example.com/missing".into()),
            BatchJob::Url(c.into()),
            BatchJob::Export {
                identity: DatasetIdentity::from_export_id("chat-9").unwrap(),
                source: DatasetSource::file(&export_path),
            },
        ])
        .await;
    let aggregates = runner.aggregate_domains(&reports).await;

    let labels: Vec<&str> = aggregates.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["example.com/_aggregate", "other.org/_aggregate"]);
    assert!(aggregates.iter().all(|r| r.is_success()), "{aggregates:?}");

    let root = temp.path().join("example.com").join("_aggregate");
    let html = fs::read_to_string(root.join("html").join("_aggregate.html")).unwrap();
    assert!(html.starts_with("<!-- Source URL: domain://example.com -->"));
    let (a_slug, b_slug) = (assign(a).unwrap().slug, assign(b).unwrap().slug);
    let (first, second) = if a_slug < b_slug { (a, b) } else { (b, a) };
    let first_at = html.find(&format!("<h2>{first}</h2>")).unwrap();
    let second_at = html.find(&format!("<h2>{second}</h2>")).unwrap();
    assert!(first_at < second_at);
    assert!(!html.contains("missing"));
    assert!(root.join("markdown").join("_aggregate.md").is_file());
    assert!(root.join("_aggregate.manifest.json").is_file());
    assert!(!temp.path().join("chat-9").join("_aggregate").exists());

    match &aggregates[0].outcome {
        DatasetOutcome::Completed(summary) => {
            assert!(summary.outcome(ArtifactType::Text).unwrap().success)
        }
        other => panic!("expected a completed aggregate, got {other:?}"),
    }
}

#[tokio::test]
async fn aggregate_rerun_with_overwrite_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let a = "https://example.com/a";
    let pages = [a];
    let overwrite = RunOptions {
        overwrite: true,
        ..RunOptions::default()
    };
    let build = || {
        let pages = pages
            .iter()
            .map(|url| (url.to_string(), sample_html(5)))
            .collect();
        BatchRunner::new(
            Arc::new(PipelineOrchestrator::standard(
                Arc::new(FakeRenderer::default()),
                Arc::new(FakeConverter),
            )),
            Arc::new(CannedFetcher { pages }),
            temp.path(),
            overwrite,
            1,
        )
    };
    let aggregate_dir = temp.path().join("example.com").join("_aggregate");

    let first = build();
    let reports = first.run(vec![BatchJob::Url(a.into())]).await;
    assert!(first.aggregate_domains(&reports).await[0].is_success());
    let before = common::snapshot(&aggregate_dir);

    let second = build();
    let reports = second.run(vec![BatchJob::Url(a.into())]).await;
    assert!(second.aggregate_domains(&reports).await[0].is_success());
    assert_eq!(common::snapshot(&aggregate_dir), before);
}

#[tokio::test]
async fn cancelled_runner_skips_aggregates() {
    let temp = TempDir::new().unwrap();
    let a = "https://example.com/a";
    let runner = runner(&temp, &[a], 1);
    let reports = runner.run(vec![BatchJob::Url(a.into())]).await;
    runner.cancellation_token().cancel();

    let aggregates = runner.aggregate_domains(&reports).await;
    assert_eq!(aggregates.len(), 1);
    assert!(matches!(aggregates[0].outcome, DatasetOutcome::Cancelled));
    assert!(!temp.path().join("example.com").join("_aggregate").exists());
}
