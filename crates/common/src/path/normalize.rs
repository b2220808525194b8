// Storage segment validation: NFKC normalization, traversal rejection, 255 char max.
//
// Collection and document ids become directory names under the history
// root, so each must be exactly one safe path component.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed segment length in characters.
const MAX_SEGMENT_CHARS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("segment is empty")]
    Empty,

    #[error("segment exceeds maximum length of {MAX_SEGMENT_CHARS} characters")]
    TooLong,

    #[error("segment is a directory traversal component: {0}")]
    Traversal(String),

    #[error("segment contains null byte")]
    NullByte,

    #[error("segment contains a path separator: {0}")]
    Separator(String),

    #[error("segment contains invalid characters: {0}")]
    InvalidComponent(String),
}

/// Normalize an id that will be used as a single directory or file stem.
///
/// Rules:
/// - Apply Unicode NFKC normalization
/// - Reject `/` and `\` (a segment never spans directories)
/// - Reject `.` and `..` (traversal)
/// - Reject null bytes, control characters and whitespace-only input
/// - Enforce max 255 character limit (after normalization)
pub fn normalize_segment(input: &str) -> Result<String, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let normalized: String = input.nfkc().collect();

    if normalized.contains('/') || normalized.contains('\\') {
        return Err(PathError::Separator(normalized));
    }

    if normalized == "." || normalized == ".." {
        return Err(PathError::Traversal(normalized));
    }

    if normalized.trim().is_empty() {
        return Err(PathError::InvalidComponent("(whitespace-only segment)".to_string()));
    }

    if normalized.chars().any(char::is_control) {
        return Err(PathError::InvalidComponent("(control character)".to_string()));
    }

    if normalized.chars().count() > MAX_SEGMENT_CHARS {
        return Err(PathError::TooLong);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_segment() {
        assert_eq!(normalize_segment("blog-posts").unwrap(), "blog-posts");
    }

    #[test]
    fn test_unicode_nfkc() {
        // NFKC normalizes ﬁ (U+FB01, fi ligature) to "fi"
        assert_eq!(normalize_segment("\u{FB01}le").unwrap(), "file");
    }

    #[test]
    fn test_unicode_combining() {
        let composed = normalize_segment("caf\u{0065}\u{0301}").unwrap();
        let expected = normalize_segment("café").unwrap();
        assert_eq!(composed, expected);
    }

    #[test]
    fn test_reject_dotdot() {
        assert_eq!(normalize_segment(".."), Err(PathError::Traversal("..".to_string())));
    }

    #[test]
    fn test_reject_dot() {
        assert_eq!(normalize_segment("."), Err(PathError::Traversal(".".to_string())));
    }

    #[test]
    fn test_reject_forward_slash() {
        assert!(matches!(normalize_segment("posts/../etc"), Err(PathError::Separator(_))));
    }

    #[test]
    fn test_reject_backslash() {
        assert!(matches!(normalize_segment("posts\\hello"), Err(PathError::Separator(_))));
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!(normalize_segment(""), Err(PathError::Empty));
    }

    #[test]
    fn test_reject_whitespace_only() {
        assert!(matches!(normalize_segment("   "), Err(PathError::InvalidComponent(_))));
    }

    #[test]
    fn test_reject_null_byte() {
        assert_eq!(normalize_segment("doc\0"), Err(PathError::NullByte));
    }

    #[test]
    fn test_reject_control_character() {
        assert!(matches!(normalize_segment("doc\n1"), Err(PathError::InvalidComponent(_))));
    }

    #[test]
    fn test_max_length_exactly() {
        assert!(normalize_segment(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn test_over_max_length() {
        assert_eq!(normalize_segment(&"a".repeat(256)), Err(PathError::TooLong));
    }

    // Names that look dangerous but are valid
    #[test]
    fn test_dotfile_allowed() {
        assert_eq!(normalize_segment(".drafts").unwrap(), ".drafts");
    }

    #[test]
    fn test_triple_dot_allowed() {
        assert_eq!(normalize_segment("...").unwrap(), "...");
    }
}
