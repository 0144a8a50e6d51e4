/// Values written into the Markdown frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta<'a> {
    pub dataset: &'a str,
    pub source_url: Option<&'a str>,
    pub title: Option<&'a str>,
}

/// Deterministic whitespace token count.
pub fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Prefix `body_markdown` with a frontmatter block. No timestamps, so the same
/// input always yields the same document.
pub fn build_markdown_document(meta: &DocumentMeta<'_>, body_markdown: &str) -> (u32, String) {
    let token_count = count_tokens(body_markdown);
    let frontmatter = format!(
        "---\ndataset: {dataset}\nsource_url: {url}\ntitle: {title}\ntoken_count: {token_count}\n---\n\n",
        dataset = single_line(meta.dataset),
        url = meta.source_url.map(single_line).unwrap_or_else(|| "none".to_string()),
        title = meta.title.map(single_line).unwrap_or_else(|| "untitled".to_string()),
    );
    (token_count, format!("{frontmatter}{body_markdown}"))
}

/// The body after a leading `---` block, or the whole input if there is none.
pub fn strip_frontmatter(markdown: &str) -> &str {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return markdown;
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return rest[offset..].trim_start_matches('\n');
        }
    }
    markdown
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
