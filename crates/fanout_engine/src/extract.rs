use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

const BLOCK_TAGS: [&str; 4] = ["p", "li", "pre", "blockquote"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// One turn of a chat transcript export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: String,
    pub text: String,
}

/// Document content in the shape serialized for JSON artifacts.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredDocument {
    pub title: Option<String>,
    pub headings: Vec<Heading>,
    pub blocks: Vec<String>,
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    pub text: String,
}

/// Title plus the HTML of the main content region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content_html: String,
}

/// `<article>` inner HTML if present, otherwise `<body>`, otherwise the whole document.
pub fn main_content(html: &str) -> ExtractedContent {
    let doc = Html::parse_document(html);
    let title = selector("title")
        .and_then(|sel| doc.select(&sel).next().map(|t| collapse_whitespace(t.text())))
        .filter(|t| !t.is_empty());
    let content_html = ["article", "body"]
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| doc.select(&sel).next().map(|node| node.inner_html()))
        .unwrap_or_else(|| doc.root_element().html());
    ExtractedContent {
        title,
        content_html,
    }
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> StructuredDocument;
}

/// Lightweight "readability-like" extractor:
/// - pulls `<title>` text if present, else the first `<h1>`
/// - scopes content to `<article>` if present, otherwise `<body>`
/// - collects headings, top-level text blocks and links in document order
/// - collects chat turns marked with `data-message-author-role`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityLikeExtractor;

impl Extractor for ReadabilityLikeExtractor {
    fn extract(&self, html: &str) -> StructuredDocument {
        let doc = Html::parse_document(html);
        let (Some(title_sel), Some(scope_sel), Some(content_sel), Some(link_sel), Some(msg_sel)) = (
            selector("title"),
            selector("article, body"),
            selector("h1, h2, h3, h4, h5, h6, p, li, pre, blockquote"),
            selector("a[href]"),
            selector("[data-message-author-role]"),
        ) else {
            return StructuredDocument::default();
        };

        let scope = doc
            .select(&scope_sel)
            .find(|el| el.value().name() == "article")
            .or_else(|| doc.select(&scope_sel).next())
            .unwrap_or_else(|| doc.root_element());

        let mut headings = Vec::new();
        let mut blocks = Vec::new();
        let mut segments = Vec::new();
        for el in scope.select(&content_sel) {
            let text = collapse_whitespace(el.text());
            if text.is_empty() {
                continue;
            }
            if let Some(level) = heading_level(el.value().name()) {
                headings.push(Heading {
                    level,
                    text: text.clone(),
                });
                segments.push(text);
            } else if !inside_block(&el) {
                blocks.push(text.clone());
                segments.push(text);
            }
        }

        let links = scope
            .select(&link_sel)
            .filter_map(|el| {
                let href = el.value().attr("href")?.trim();
                (!href.is_empty()).then(|| Link {
                    text: collapse_whitespace(el.text()),
                    href: href.to_string(),
                })
            })
            .collect();

        let messages = doc
            .select(&msg_sel)
            .filter_map(|el| {
                let role = el.value().attr("data-message-author-role")?;
                Some(Message {
                    role: role.to_string(),
                    text: collapse_whitespace(el.text()),
                })
            })
            .collect();

        let title = doc
            .select(&title_sel)
            .next()
            .map(|t| collapse_whitespace(t.text()))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                headings
                    .iter()
                    .find(|h| h.level == 1)
                    .map(|h| h.text.clone())
            });

        StructuredDocument {
            title,
            headings,
            blocks,
            links,
            messages,
            text: segments.join("\n\n"),
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// True when an ancestor is itself a collected block, so its text is already counted.
fn inside_block(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()))
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_content_prefers_article() {
        let content = main_content(
            "<html><head><title> T </title></head><body><nav>x</nav><article><p>a</p></article></body></html>",
        );
        assert_eq!(content.title.as_deref(), Some("T"));
        assert_eq!(content.content_html, "<p>a</p>");
    }

    #[test]
    fn nested_list_paragraphs_are_not_double_counted() {
        let doc = ReadabilityLikeExtractor.extract("<body><ul><li><p>one</p></li></ul></body>");
        assert_eq!(doc.blocks, vec!["one".to_string()]);
    }
}
