use super::parse;

/// Longest preview stored in a manifest entry, in characters.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Short text preview of a document body. A malformed header falls back to
/// previewing the raw content.
pub fn generate_preview(content: &str) -> String {
    let body = match parse(content) {
        Ok(parsed) => parsed.body,
        Err(_) => content.to_string(),
    };
    body.trim().chars().take(PREVIEW_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_strips_header_and_trims() {
        let doc = "---\ntitle: Hello\n_version_label: \"x\"\n---\n\n  Body starts here  \n";
        assert_eq!(generate_preview(doc), "Body starts here");
    }

    #[test]
    fn preview_truncates_by_characters() {
        let body = "é".repeat(150);
        let preview = generate_preview(&body);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
    }

    #[test]
    fn preview_falls_back_to_raw_content_on_bad_header() {
        let doc = "---\ntitle: [oops\n---\nbody";
        assert_eq!(generate_preview(doc), "---\ntitle: [oops\n---\nbody");
    }

    #[test]
    fn preview_of_header_only_document_is_empty() {
        assert_eq!(generate_preview("---\ntitle: x\n---\n"), "");
    }
}
