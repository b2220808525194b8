// YAML front matter: the `---` delimited header block at the top of a document.

use std::collections::BTreeMap;

use thiserror::Error;

mod label;
mod preview;

pub use label::{extract_label, inject_label, normalize_label, strip_label, LABEL_KEY};
pub use preview::{generate_preview, PREVIEW_MAX_CHARS};

const DELIMITER: &str = "---";

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("header block is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Borrowed view of a document split at its header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBlock<'a> {
    /// YAML between the delimiter lines, including its trailing newline.
    pub yaml: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
    /// Byte offset of `yaml` within the source.
    pub yaml_start: usize,
}

/// A document with its header decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    pub data: BTreeMap<String, serde_json::Value>,
    pub body: String,
}

/// Locate the header block. `None` when the document does not open with a
/// delimiter line or the block is never closed.
pub fn split(content: &str) -> Option<HeaderBlock<'_>> {
    let after_open = content.strip_prefix(DELIMITER)?;
    let yaml_start = if after_open.starts_with("\r\n") {
        DELIMITER.len() + 2
    } else if after_open.starts_with('\n') {
        DELIMITER.len() + 1
    } else {
        return None;
    };

    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DELIMITER {
            return Some(HeaderBlock {
                yaml: &content[yaml_start..offset],
                body: &content[offset + line.len()..],
                yaml_start,
            });
        }
        offset += line.len();
    }
    None
}

/// Decode the header block into a string-keyed map.
///
/// Documents without a header parse to an empty map with the whole content
/// as body. A header that is present but is not a YAML mapping is an error.
pub fn parse(content: &str) -> Result<ParsedDocument, FrontmatterError> {
    let Some(block) = split(content) else {
        return Ok(ParsedDocument { data: BTreeMap::new(), body: content.to_string() });
    };

    let data = if block.yaml.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_yaml::from_str::<BTreeMap<String, serde_json::Value>>(block.yaml)?
    };

    Ok(ParsedDocument { data, body: block.body.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_finds_header_and_body() {
        let doc = "---\ntitle: Hello\n---\n# Heading\n";
        let block = split(doc).expect("header should be found");
        assert_eq!(block.yaml, "title: Hello\n");
        assert_eq!(block.body, "# Heading\n");
        assert_eq!(block.yaml_start, 4);
    }

    #[test]
    fn split_handles_crlf_delimiters() {
        let doc = "---\r\ntitle: Hello\r\n---\r\nbody";
        let block = split(doc).expect("header should be found");
        assert_eq!(block.yaml, "title: Hello\r\n");
        assert_eq!(block.body, "body");
    }

    #[test]
    fn split_handles_empty_block_and_missing_body() {
        let block = split("---\n---").expect("empty block should be found");
        assert_eq!(block.yaml, "");
        assert_eq!(block.body, "");
    }

    #[test]
    fn split_ignores_documents_without_opening_delimiter() {
        assert!(split("# Title\n---\nnot a header\n---\n").is_none());
        assert!(split("----\ntitle: x\n---\n").is_none());
    }

    #[test]
    fn split_ignores_unterminated_block() {
        assert!(split("---\ntitle: x\nbody without close\n").is_none());
    }

    #[test]
    fn parse_decodes_mapping() {
        let doc = "---\ntitle: Hello\ndraft: true\ntags: [a, b]\n---\nBody text";
        let parsed = parse(doc).expect("header should parse");
        assert_eq!(parsed.data["title"], json!("Hello"));
        assert_eq!(parsed.data["draft"], json!(true));
        assert_eq!(parsed.data["tags"], json!(["a", "b"]));
        assert_eq!(parsed.body, "Body text");
    }

    #[test]
    fn parse_without_header_returns_whole_body() {
        let parsed = parse("just text").expect("plain text should parse");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.body, "just text");
    }

    #[test]
    fn parse_rejects_invalid_yaml() {
        assert!(parse("---\ntitle: [unclosed\n---\nbody").is_err());
    }

    #[test]
    fn parse_rejects_scalar_header() {
        assert!(parse("---\njust a string\n---\nbody").is_err());
    }
}
