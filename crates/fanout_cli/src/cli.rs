use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use fanout_logging::DEFAULT_LOG_FILE;

/// Fan a rendered document out into HTML, Markdown, text, JSON and PDF
/// artifacts, each split into size-bounded parts.
#[derive(Debug, Parser)]
#[command(
    name = "artifact-fanout",
    version,
    about = "Generate chunked HTML/Markdown/text/JSON/PDF artifacts from rendered exports and web pages"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand. Flags override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// RON file with a `PipelineConfig`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for `{domain}/{slug}/{type}` output trees.
    #[arg(long, global = true)]
    pub output_root: Option<PathBuf>,

    /// Maximum bytes per part file.
    #[arg(long, global = true)]
    pub chunk_bytes: Option<usize>,

    /// Replace existing artifacts and remove stale parts.
    #[arg(long, global = true)]
    pub overwrite: bool,

    #[arg(long, global = true)]
    pub render_timeout_ms: Option<u64>,

    /// Datasets processed concurrently in batch mode.
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Headless browser used to print PDFs.
    #[arg(long, global = true)]
    pub pdf_command: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Also log to the terminal; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process a rendered export from disk.
    Export {
        /// Export id; becomes the dataset slug.
        #[arg(long)]
        id: String,

        /// Rendered HTML file.
        #[arg(long)]
        input: PathBuf,

        /// Original location of the export, recorded in the artifacts.
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Fetch one page and process it.
    Url { url: String },

    /// Fetch and process every URL listed in a file.
    Batch {
        /// One URL per line; blank lines and `#` comments are skipped.
        #[arg(long)]
        urls: PathBuf,

        /// Skip the combined `{domain}/_aggregate` dataset built per domain.
        #[arg(long)]
        no_aggregate: bool,
    },

    /// Re-hash the files listed in a run manifest.
    Verify { manifest: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "artifact-fanout",
            "url",
            "https://example.com",
            "--chunk-bytes",
            "1000",
            "--overwrite",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.chunk_bytes, Some(1000));
        assert!(cli.global.overwrite);
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Command::Url { ref url } if url == "https://example.com"));
    }

    #[test]
    fn batch_aggregates_unless_disabled() {
        let cli = Cli::try_parse_from(["artifact-fanout", "batch", "--urls", "list.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Batch { no_aggregate: false, .. }));
        let cli = Cli::try_parse_from([
            "artifact-fanout",
            "batch",
            "--urls",
            "list.txt",
            "--no-aggregate",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Batch { no_aggregate: true, .. }));
    }
}
