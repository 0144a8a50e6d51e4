use std::fmt::Write as _;

use fanout_core::{ArtifactType, RunSummary};
use fanout_engine::{DatasetOutcome, DatasetReport, VerifyReport};

const FORMAT_WIDTH: usize = 10;
const STATUS_WIDTH: usize = 8;
const PARTS_WIDTH: usize = 7;

/// Table of per-format outcomes for one dataset.
pub fn render_dataset(report: &DatasetReport) -> String {
    let mut out = format!("Dataset: {}\n", report.label);
    match &report.outcome {
        DatasetOutcome::Completed(summary) => out.push_str(&render_summary(summary)),
        DatasetOutcome::Failed(err) => {
            let _ = writeln!(out, "  not processed ({}): {err}", err.kind());
        }
        DatasetOutcome::Cancelled => out.push_str("  cancelled before start\n"),
    }
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<FORMAT_WIDTH$}{:<STATUS_WIDTH$}{:<PARTS_WIDTH$}DETAIL",
        "FORMAT", "STATUS", "PARTS"
    );
    for ty in ArtifactType::ALL {
        let Some(outcome) = summary.outcome(ty) else {
            continue;
        };
        let (status, parts, detail) = match (&outcome.manifest, &outcome.error) {
            (Some(manifest), _) => (
                "ok",
                manifest.total_parts.to_string(),
                manifest.aggregate_path.display().to_string(),
            ),
            (None, Some(failure)) => ("FAILED", "-".to_string(), failure.message.clone()),
            (None, None) => ("FAILED", "-".to_string(), String::new()),
        };
        let _ = writeln!(
            out,
            "  {:<FORMAT_WIDTH$}{:<STATUS_WIDTH$}{:<PARTS_WIDTH$}{}",
            ty.label(),
            status,
            parts,
            detail
        );
    }
    out
}

pub fn render_verify(report: &VerifyReport) -> String {
    let mut out = format!(
        "Checked {} file(s): {} missing, {} mismatched\n",
        report.checked,
        report.missing.len(),
        report.mismatched.len()
    );
    for path in &report.missing {
        let _ = writeln!(out, "  missing    {}", path.display());
    }
    for path in &report.mismatched {
        let _ = writeln!(out, "  mismatch   {}", path.display());
    }
    out
}
