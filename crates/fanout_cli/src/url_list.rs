/// URLs from a newline-separated list. Blank lines and `#` comments are
/// skipped; surrounding quotes are stripped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
