//! Dataset identities and the URL → `(domain, slug)` mapping.
//!
//! `assign` is a pure function of the URL string: no clock, randomness, or
//! process state. Trivially equivalent URLs (case of scheme/host/path, default
//! port, percent-encoding, trailing slash, fragment) share a slug.

use std::fmt::Write as _;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::{Host, Url};

use crate::PipelineError;

const MAX_COMPONENT_LEN: usize = 80;

/// Slug of the combined dataset built from every page of one domain. URL
/// slugs always carry a `--{hash8}` suffix, so this never collides.
pub const DOMAIN_AGGREGATE_SLUG: &str = "_aggregate";

/// Second-level labels that, under these top-level labels, form a public suffix.
const TWO_LEVEL_SUFFIXES: &[&str] = &[
    "ac.uk", "co.uk", "gov.uk", "org.uk", "com.au", "net.au", "org.au", "co.nz", "co.jp",
    "co.za", "com.br", "com.cn", "com.mx", "co.in", "co.kr",
];

/// Who a dataset is and where its outputs live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetIdentity {
    pub slug: String,
    pub domain: Option<String>,
}

impl DatasetIdentity {
    /// Identity for a local export; the export id becomes the slug.
    pub fn from_export_id(export_id: &str) -> Result<Self, PipelineError> {
        let slug = sanitize_component(export_id.trim(), "");
        if slug.is_empty() {
            return Err(PipelineError::invalid_input(format!(
                "export id `{export_id}` has no filesystem-safe characters"
            )));
        }
        Ok(Self { slug, domain: None })
    }

    /// The aggregate dataset for `domain`, stored beside its page datasets.
    pub fn domain_aggregate(domain: &str) -> Self {
        Self {
            slug: DOMAIN_AGGREGATE_SLUG.to_string(),
            domain: Some(domain.to_string()),
        }
    }

    pub fn is_domain_aggregate(&self) -> bool {
        self.domain.is_some() && self.slug == DOMAIN_AGGREGATE_SLUG
    }

    /// `{domain}/{slug}` for URL datasets, `{slug}` otherwise.
    pub fn relative_dir(&self) -> PathBuf {
        match &self.domain {
            Some(domain) => PathBuf::from(domain).join(&self.slug),
            None => PathBuf::from(&self.slug),
        }
    }

    /// Human-readable label for logs and summaries.
    pub fn label(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{domain}/{}", self.slug),
            None => self.slug.clone(),
        }
    }
}

/// Map `url` onto its domain bucket and slug.
///
/// The slug is `{readable}--{hash8}`; `hash8` is the SHA-256 prefix of the
/// normalized URL, so distinct normalized URLs collide only on a hash-prefix
/// collision.
pub fn assign(url: &str) -> Result<DatasetIdentity, PipelineError> {
    let parsed = parse(url)?;
    let normalized = normalize_parsed(&parsed);
    let domain = parsed.host().map(|host| registrable_domain(&host));
    let readable = readable_slug(&decoded_path(&parsed), decoded_query(&parsed).as_deref());
    let slug = format!("{readable}--{}", short_hash(&normalized));
    Ok(DatasetIdentity { slug, domain })
}

/// Canonical string form used for slug hashing.
pub fn normalize_url(url: &str) -> Result<String, PipelineError> {
    parse(url).map(|parsed| normalize_parsed(&parsed))
}

/// Filesystem-safe component: keeps ASCII alphanumerics, `.`, `_` and `-`,
/// collapses everything else to single dashes, trims separators, caps length,
/// and patches Windows reserved device names.
pub fn sanitize_component(input: &str, fallback: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_') {
            cleaned.push(c);
            prev_dash = false;
        } else if !prev_dash {
            cleaned.push('-');
            prev_dash = true;
        }
    }
    let mut cleaned = cleaned
        .trim_matches(&['-', '_', '.', ' '][..])
        .to_string();
    if cleaned.len() > MAX_COMPONENT_LEN {
        cleaned.truncate(MAX_COMPONENT_LEN);
        cleaned = cleaned.trim_end_matches(&['-', '_', '.'][..]).to_string();
    }
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn parse(url: &str) -> Result<Url, PipelineError> {
    Url::parse(url.trim())
        .map_err(|err| PipelineError::invalid_input(format!("invalid url `{url}`: {err}")))
}

fn normalize_parsed(url: &Url) -> String {
    // `Url` already lowercases scheme and host and drops default ports.
    let mut out = format!("{}://", url.scheme());
    if let Some(host) = url.host_str() {
        out.push_str(host);
    }
    if let Some(port) = url.port() {
        let _ = write!(out, ":{port}");
    }
    out.push_str(&decoded_path(url));
    if let Some(query) = decoded_query(url) {
        out.push('?');
        out.push_str(&query);
    }
    out
}

fn decoded_path(url: &Url) -> String {
    let decoded = percent_decode_str(url.path())
        .decode_utf8_lossy()
        .to_lowercase();
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn decoded_query(url: &Url) -> Option<String> {
    url.query()
        .filter(|q| !q.is_empty())
        .map(|q| percent_decode_str(q).decode_utf8_lossy().to_lowercase())
}

fn readable_slug(path: &str, query: Option<&str>) -> String {
    let mut parts: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if let Some(query) = query {
        parts.push(query.replace(['=', '&'], "-"));
    }
    if parts.is_empty() {
        return "index".to_string();
    }
    sanitize_component(&parts.join("_"), "page")
}

fn registrable_domain(host: &Host<&str>) -> String {
    let name = match host {
        Host::Domain(domain) => *domain,
        Host::Ipv4(addr) => return addr.to_string(),
        Host::Ipv6(addr) => return sanitize_component(&addr.to_string(), "root"),
    };
    let name = name.trim_end_matches('.');
    let labels: Vec<&str> = name.split('.').filter(|l| !l.is_empty()).collect();
    let keep = match labels.len() {
        0 => return "root".to_string(),
        1 | 2 => labels.len(),
        n => {
            let tail = format!("{}.{}", labels[n - 2], labels[n - 1]);
            if TWO_LEVEL_SUFFIXES.contains(&tail.as_str()) {
                3
            } else {
                2
            }
        }
    };
    sanitize_component(&labels[labels.len() - keep..].join("."), "root")
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrable_domain_strips_subdomains() {
        let id = assign("https://docs.Example.com/guide").unwrap();
        assert_eq!(id.domain.as_deref(), Some("example.com"));

        let id = assign("https://www.bbc.co.uk/news").unwrap();
        assert_eq!(id.domain.as_deref(), Some("bbc.co.uk"));

        let id = assign("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(id.domain.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn root_url_gets_index_slug() {
        let id = assign("https://example.com").unwrap();
        assert!(id.slug.starts_with("index--"), "{}", id.slug);
        assert_eq!(id.slug.len(), "index--".len() + 8);
    }

    #[test]
    fn sanitize_collapses_and_patches() {
        assert_eq!(sanitize_component("a b//c", "x"), "a-b-c");
        assert_eq!(sanitize_component("***", "fallback"), "fallback");
        assert_eq!(sanitize_component("con", "x"), "con_");
        assert!(sanitize_component(&"a".repeat(200), "x").len() <= MAX_COMPONENT_LEN);
    }

    #[test]
    fn export_ids_must_have_safe_characters() {
        assert_eq!(
            DatasetIdentity::from_export_id("chat export 2024").unwrap().slug,
            "chat-export-2024"
        );
        assert!(DatasetIdentity::from_export_id("///").is_err());
    }

    #[test]
    fn invalid_urls_are_invalid_input() {
        assert_eq!(
            assign("not a url").unwrap_err().kind(),
            crate::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn relative_dir_nests_under_domain() {
        let id = DatasetIdentity {
            slug: "s".into(),
            domain: Some("example.com".into()),
        };
        assert_eq!(id.relative_dir(), PathBuf::from("example.com/s"));
        assert_eq!(id.label(), "example.com/s");
    }
}
