//! Fan-out engine: rendering, generation, chunked writes and batch execution.
mod aggregate;
mod convert;
mod decode;
mod extract;
mod fetch;
mod frontmatter;
mod generate;
mod manifest;
mod output_dir;
mod persist;
mod pipeline;
mod render;
mod runner;
mod source;
mod writer;

pub use aggregate::{collect_domain_pages, compose_aggregate_html, AggregatePage};
pub use convert::{Converter, Html2MdConverter};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use extract::{
    main_content, ExtractedContent, Extractor, Heading, Link, Message, ReadabilityLikeExtractor,
    StructuredDocument,
};
pub use fetch::{
    FetchError, FetchFailure, FetchMetadata, FetchOutput, FetchSettings, Fetcher, ReqwestFetcher,
};
pub use frontmatter::{build_markdown_document, count_tokens, strip_frontmatter, DocumentMeta};
pub use generate::{
    markdown_to_text, standard_generators, FormatGenerator, GeneratedArtifact, GenerationContext,
    HtmlGenerator, JsonGenerator, MarkdownGenerator, PdfGenerator, TextGenerator,
};
pub use manifest::{
    manifest_file_name, verify_run_manifest, write_run_manifest, ErrorRecord, FileRecord,
    FormatRecord, RunManifest, VerifyReport, MANIFEST_SUFFIX,
};
pub use output_dir::{OutputDirectoryManager, OutputDirs, PrepareReport};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedWrite};
pub use pipeline::{PipelineOrchestrator, RunOptions};
pub use render::{HeadlessRenderer, PdfOptions, Renderer};
pub use runner::{BatchJob, BatchRunner, DatasetOutcome, DatasetReport};
pub use source::{embedded_source_url, source_url_comment, DatasetSource, SourceDocument};
pub use writer::{ArtifactSink, ArtifactWriter};
