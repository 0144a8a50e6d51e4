use fanout_engine::{
    decode_html, main_content, markdown_to_text, Converter, Extractor, Html2MdConverter,
    ReadabilityLikeExtractor,
};
use pretty_assertions::assert_eq;

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9";
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.html, "café");
}

#[test]
fn decode_handles_utf8_bom() {
    let decoded = decode_html(b"\xEF\xBB\xBFhello", Some("text/html")).unwrap();
    assert_eq!(decoded.html, "hello");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn extractor_builds_structured_document() {
    let html = r#"
    <html><head><title>Title</title></head>
    <body>
        <nav><a href="/home">Home</a></nav>
        <article>
            <h1>Heading</h1>
            <p>Body   text with <a href="https://example.com/x">a link</a></p>
            <h2>Section</h2>
            <ul><li>first</li><li>second</li></ul>
        </article>
    </body></html>
    "#;
    let doc = ReadabilityLikeExtractor.extract(html);
    assert_eq!(doc.title.as_deref(), Some("Title"));
    assert_eq!(
        doc.headings.iter().map(|h| (h.level, h.text.as_str())).collect::<Vec<_>>(),
        vec![(1, "Heading"), (2, "Section")]
    );
    assert_eq!(doc.blocks, vec!["Body text with a link", "first", "second"]);
    assert_eq!(doc.links.len(), 1);
    assert_eq!(doc.links[0].href, "https://example.com/x");
    assert_eq!(
        doc.text,
        "Heading\n\nBody text with a link\n\nSection\n\nfirst\n\nsecond"
    );
    assert!(doc.messages.is_empty());
}

#[test]
fn extractor_collects_chat_turns() {
    let html = r#"<body>
        <div data-message-author-role="user"><p>Hi there</p></div>
        <div data-message-author-role="assistant"><p>Hello!</p></div>
    </body>"#;
    let doc = ReadabilityLikeExtractor.extract(html);
    let turns: Vec<_> = doc
        .messages
        .iter()
        .map(|m| (m.role.as_str(), m.text.as_str()))
        .collect();
    assert_eq!(turns, vec![("user", "Hi there"), ("assistant", "Hello!")]);
    assert_eq!(doc.title, None);
}

#[test]
fn converter_turns_html_into_markdown() {
    let md = Html2MdConverter.to_markdown("<h1>Hello</h1><p>world</p>");
    let trimmed = md.trim();
    assert!(
        trimmed.starts_with("# Hello") || trimmed.starts_with("Hello\n=="),
        "unexpected markdown output: {md:?}"
    );
    assert!(trimmed.contains("world"));
}

#[test]
fn decode_extract_convert_is_deterministic() {
    let bytes = br#"<html><head><title>X</title></head><body><article><p>A</p><p>B</p></article></body></html>"#;
    let decoded = decode_html(bytes, Some("text/html; charset=utf-8")).unwrap();
    let content = main_content(&decoded.html);
    assert_eq!(content.title.as_deref(), Some("X"));
    let first = Html2MdConverter.to_markdown(&content.content_html);
    let second = Html2MdConverter.to_markdown(&content.content_html);
    assert_eq!(first, second);
    assert_eq!(first.trim(), "A\n\nB");
    assert_eq!(markdown_to_text(&first), "A\n\nB\n");
}
