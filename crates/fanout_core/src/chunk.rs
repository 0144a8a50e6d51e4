//! Byte-level chunking and the on-disk part naming scheme.
//!
//! Parts are cut at byte offsets only; a part of UTF-8 text may end in the
//! middle of a multi-byte character. Concatenating the parts in index order
//! restores the payload exactly.

use crate::{ArtifactType, PipelineError};

/// Split `payload` into ordered parts of at most `max_bytes_per_part` bytes.
///
/// A payload that fits (including an empty one) yields exactly one part.
pub fn split(payload: &[u8], max_bytes_per_part: usize) -> Result<Vec<&[u8]>, PipelineError> {
    if max_bytes_per_part == 0 {
        return Err(PipelineError::invalid_input(
            "max_bytes_per_part must be positive",
        ));
    }
    if payload.len() <= max_bytes_per_part {
        return Ok(vec![payload]);
    }
    Ok(payload.chunks(max_bytes_per_part).collect())
}

/// Number of parts [`split`] produces for a payload of `len` bytes.
pub fn part_count(len: usize, max_bytes_per_part: usize) -> Result<usize, PipelineError> {
    if max_bytes_per_part == 0 {
        return Err(PipelineError::invalid_input(
            "max_bytes_per_part must be positive",
        ));
    }
    Ok(len.div_ceil(max_bytes_per_part).max(1))
}

/// `{base}_{type}_part_{index:02}_of_{total:02}{extension}`
pub fn part_name(
    base_name: &str,
    artifact_type: ArtifactType,
    index: usize,
    total_parts: usize,
    extension: &str,
) -> String {
    format!(
        "{base_name}_{label}_part_{index:02}_of_{total_parts:02}{extension}",
        label = artifact_type.label()
    )
}

/// `{base}{extension}`
pub fn aggregate_name(base_name: &str, extension: &str) -> String {
    format!("{base_name}{extension}")
}

/// Recover `(index, total)` from a part file name produced by [`part_name`].
///
/// Returns `None` for names that belong to a different base name, type, or
/// extension, or whose numbers are missing or malformed.
pub fn parse_part_name(
    file_name: &str,
    base_name: &str,
    artifact_type: ArtifactType,
    extension: &str,
) -> Option<(usize, usize)> {
    let prefix = format!("{base_name}_{}_part_", artifact_type.label());
    let numbers = file_name.strip_prefix(&prefix)?.strip_suffix(extension)?;
    let (index, total) = numbers.split_once("_of_")?;
    Some((parse_digits(index)?, parse_digits(total)?))
}

fn parse_digits(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_rejected() {
        let err = split(b"abc", 0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
        assert!(part_count(3, 0).is_err());
    }

    #[test]
    fn small_and_empty_payloads_are_single_part() {
        assert_eq!(split(b"abc", 3).unwrap(), vec![&b"abc"[..]]);
        assert_eq!(split(b"", 10).unwrap(), vec![&b""[..]]);
        assert_eq!(part_count(0, 10).unwrap(), 1);
    }

    #[test]
    fn names_pad_to_two_digits_and_grow_beyond() {
        assert_eq!(
            part_name("chat", ArtifactType::Html, 3, 12, ".html"),
            "chat_html_part_03_of_12.html"
        );
        assert_eq!(
            part_name("chat", ArtifactType::Pdf, 7, 120, ".pdf"),
            "chat_pdf_part_07_of_120.pdf"
        );
    }

    #[test]
    fn parse_inverts_part_name() {
        let name = part_name("a_b", ArtifactType::Markdown, 4, 9, ".md");
        assert_eq!(
            parse_part_name(&name, "a_b", ArtifactType::Markdown, ".md"),
            Some((4, 9))
        );
        assert_eq!(parse_part_name(&name, "a", ArtifactType::Markdown, ".md"), None);
        assert_eq!(parse_part_name(&name, "a_b", ArtifactType::Text, ".md"), None);
        assert_eq!(
            parse_part_name("a_b_markdown_part_x_of_2.md", "a_b", ArtifactType::Markdown, ".md"),
            None
        );
        assert_eq!(
            parse_part_name("a_b_markdown_part_01_of_.md", "a_b", ArtifactType::Markdown, ".md"),
            None
        );
    }
}
