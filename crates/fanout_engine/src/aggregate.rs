//! Per-domain aggregate pages built from the HTML artifacts of a batch.

use std::collections::BTreeMap;

use fanout_core::ArtifactType;
use fanout_logging::fanout_warn;
use scraper::{Html, Selector};

use crate::runner::{DatasetOutcome, DatasetReport};

/// One successfully rendered page of a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePage {
    pub slug: String,
    pub url: String,
    pub html: String,
}

/// Pages whose HTML artifact was written, grouped by domain and sorted by slug.
///
/// Exports (no domain) and earlier aggregates are skipped; a page listed
/// twice contributes once.
pub async fn collect_domain_pages(reports: &[DatasetReport]) -> BTreeMap<String, Vec<AggregatePage>> {
    let mut domains: BTreeMap<String, BTreeMap<String, AggregatePage>> = BTreeMap::new();
    for report in reports {
        let (Some(identity), DatasetOutcome::Completed(summary)) = (&report.identity, &report.outcome)
        else {
            continue;
        };
        let Some(domain) = identity.domain.as_ref().filter(|_| !identity.is_domain_aggregate()) else {
            continue;
        };
        let Some(manifest) = summary
            .outcome(ArtifactType::Html)
            .and_then(|outcome| outcome.manifest.as_ref())
        else {
            continue;
        };
        let html = match tokio::fs::read(&manifest.aggregate_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                fanout_warn!(
                    "Leaving {} out of the {} aggregate: {}",
                    report.label,
                    domain,
                    err
                );
                continue;
            }
        };
        domains.entry(domain.clone()).or_default().insert(
            identity.slug.clone(),
            AggregatePage {
                slug: identity.slug.clone(),
                url: report.label.clone(),
                html,
            },
        );
    }
    domains
        .into_iter()
        .map(|(domain, pages)| (domain, pages.into_values().collect()))
        .collect()
}

/// A single page holding every page's `<body>`, one `<section>` each.
///
/// The sections share one `<article>` so main-content selection keeps them
/// all. No timestamps: the same pages always compose the same bytes.
pub fn compose_aggregate_html(domain: &str, pages: &[AggregatePage]) -> String {
    let domain = escape_html(domain);
    let mut parts = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "<meta charset=\"utf-8\" />".to_string(),
        format!("<title>Aggregate: {domain}</title>"),
        "</head>".to_string(),
        "<body>".to_string(),
        "<article>".to_string(),
        format!("<h1>Domain aggregate for {domain}</h1>"),
    ];
    for page in pages {
        let url = escape_html(&page.url);
        parts.push(format!(
            "<section id=\"{}\" data-source-url=\"{url}\">\n<h2>{url}</h2>\n{}\n</section>",
            escape_html(&page.slug),
            body_html(&page.html)
        ));
    }
    parts.extend(["</article>", "</body>", "</html>"].map(String::from));
    let mut html = parts.join("\n");
    html.push('\n');
    html
}

fn body_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|body| body.inner_html()))
        .unwrap_or_else(|| html.to_string())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(slug: &str, url: &str, body: &str) -> AggregatePage {
        AggregatePage {
            slug: slug.into(),
            url: url.into(),
            html: format!("<!-- Source URL: {url} -->\n<html><body>{body}</body></html>"),
        }
    }

    #[test]
    fn sections_follow_page_order_inside_one_article() {
        let html = compose_aggregate_html(
            "example.com",
            &[
                page("a--11111111", "https://example.com/a", "<p>first</p>"),
                page("b--22222222", "https://example.com/b?x=1&y=2", "<p>second</p>"),
            ],
        );
        let first = html.find("<p>first</p>").unwrap();
        let second = html.find("<p>second</p>").unwrap();
        assert!(first < second);
        assert!(html.contains("<title>Aggregate: example.com</title>"));
        assert!(html.contains("data-source-url=\"https://example.com/b?x=1&amp;y=2\""));
        assert!(!html.contains("Source URL"));
        assert_eq!(html.matches("<article>").count(), 1);
    }

    #[test]
    fn composition_is_repeatable() {
        let pages = [page("a--11111111", "https://example.com/a", "<p>x</p>")];
        assert_eq!(
            compose_aggregate_html("example.com", &pages),
            compose_aggregate_html("example.com", &pages)
        );
    }
}
