//! `artifact-fanout`: command-line front end for the fan-out pipeline.
//!
//! Exit status is 0 only when every format of every dataset succeeded,
//! 1 when any format or dataset failed, and 2 when the invocation itself
//! was unusable (bad config, unreadable URL list).

mod cli;
mod config;
mod report;
mod url_list;

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fanout_core::{DatasetIdentity, PipelineConfig};
use fanout_engine::{
    verify_run_manifest, BatchJob, BatchRunner, DatasetSource, FetchSettings, HeadlessRenderer,
    Html2MdConverter, PipelineOrchestrator, ReqwestFetcher, RunOptions,
};
use fanout_logging::{fanout_error, fanout_info, fanout_warn, level_from_verbosity, LogDestination};

use crate::cli::{Cli, Command};
use crate::url_list::parse_url_list;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let destination = if cli.global.verbose > 0 {
        LogDestination::Both(cli.global.log_file.clone())
    } else {
        LogDestination::File(cli.global.log_file.clone())
    };
    fanout_logging::initialize(destination, level_from_verbosity(cli.global.verbose));

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            fanout_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// `Ok(true)` when everything succeeded.
async fn run(cli: Cli) -> Result<bool> {
    if let Command::Verify { manifest } = &cli.command {
        let report = verify_run_manifest(manifest)
            .with_context(|| format!("verifying {}", manifest.display()))?;
        print!("{}", report::render_verify(&report));
        return Ok(report.is_clean());
    }

    let config = config::resolve(&cli.global).context("loading configuration")?;
    let aggregate = matches!(cli.command, Command::Batch { no_aggregate: false, .. });
    let jobs = jobs_for(cli.command)?;
    let runner = build_runner(&config);

    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            fanout_warn!("Interrupt received; finishing in-flight datasets");
            cancel.cancel();
        }
    });

    let mut reports = runner.run(jobs).await;
    if aggregate {
        let aggregates = runner.aggregate_domains(&reports).await;
        reports.extend(aggregates);
    }
    let mut all_ok = true;
    for report in &reports {
        print!("{}", report::render_dataset(report));
        all_ok &= report.is_success();
    }
    fanout_info!(
        "{} of {} dataset(s) fully succeeded",
        reports.iter().filter(|r| r.is_success()).count(),
        reports.len()
    );
    Ok(all_ok)
}

fn jobs_for(command: Command) -> Result<Vec<BatchJob>> {
    let jobs = match command {
        Command::Export {
            id,
            input,
            source_url,
        } => vec![BatchJob::Export {
            identity: DatasetIdentity::from_export_id(&id)?,
            source: DatasetSource::File {
                path: input,
                source_url,
            },
        }],
        Command::Url { url } => vec![BatchJob::Url(url)],
        Command::Batch { urls, .. } => {
            let text = fs::read_to_string(&urls)
                .with_context(|| format!("reading URL list {}", urls.display()))?;
            let list = parse_url_list(&text);
            if list.is_empty() {
                bail!("{} contains no URLs", urls.display());
            }
            list.into_iter().map(BatchJob::Url).collect()
        }
        Command::Verify { .. } => Vec::new(),
    };
    Ok(jobs)
}

fn build_runner(config: &PipelineConfig) -> BatchRunner {
    let renderer = HeadlessRenderer::new(config.pdf_command.clone());
    let orchestrator = PipelineOrchestrator::standard(Arc::new(renderer), Arc::new(Html2MdConverter));
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    BatchRunner::new(
        Arc::new(orchestrator),
        Arc::new(fetcher),
        config.output_root.clone(),
        RunOptions::from_config(config),
        config.workers,
    )
}
