// Snapshot labels embedded in the header block.
//
// The label is written as the first header line so it survives manifest
// loss. Only that one line is ever added or removed; the rest of the header
// stays byte-for-byte as the author wrote it.

use super::split;

/// Reserved header key carrying a snapshot label.
pub const LABEL_KEY: &str = "_version_label";

/// YAML comment closing the reserved line when it was injected into a block
/// that was already empty. Without it the block is one `inject_label` created.
const EMPTY_BLOCK_MARK: &str = "#empty-header";

/// Trim a caller-supplied label; blank labels mean "unlabeled".
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Embed `label` in the header block, creating the block if absent.
/// An existing reserved line is replaced.
pub fn inject_label(content: &str, label: &str) -> String {
    let stripped = strip_label(content);
    match split(&stripped) {
        Some(block) => {
            let line = label_line(label, block.yaml.is_empty());
            let (head, tail) = stripped.split_at(block.yaml_start);
            format!("{head}{line}{tail}")
        }
        None => format!("---\n{}---\n{stripped}", label_line(label, false)),
    }
}

/// Read the embedded label, if any.
pub fn extract_label(content: &str) -> Option<String> {
    let block = split(content)?;
    block.yaml.split_inclusive('\n').find_map(label_value)
}

/// Remove the reserved line. A header left empty by the removal is dropped
/// entirely, which undoes a block created by `inject_label`, unless the line
/// records that the block was empty before injection.
pub fn strip_label(content: &str) -> String {
    let Some(block) = split(content) else {
        return content.to_string();
    };

    let mut kept = String::with_capacity(block.yaml.len());
    let mut removed = None;
    for line in block.yaml.split_inclusive('\n') {
        match label_value_raw(line) {
            Some(value) => removed = Some(value),
            None => kept.push_str(line),
        }
    }

    let Some(value) = removed else {
        return content.to_string();
    };
    if kept.is_empty() && !value.ends_with(EMPTY_BLOCK_MARK) {
        return block.body.to_string();
    }

    let yaml_end = block.yaml_start + block.yaml.len();
    format!("{}{kept}{}", &content[..block.yaml_start], &content[yaml_end..])
}

fn label_line(label: &str, block_was_empty: bool) -> String {
    // A JSON string literal is a valid single-line YAML double-quoted scalar.
    let quoted = serde_json::to_string(label).unwrap_or_else(|_| "\"\"".to_string());
    if block_was_empty {
        format!("{LABEL_KEY}: {quoted} {EMPTY_BLOCK_MARK}\n")
    } else {
        format!("{LABEL_KEY}: {quoted}\n")
    }
}

fn label_value_raw(line: &str) -> Option<&str> {
    line.strip_prefix(LABEL_KEY)?.strip_prefix(':').map(|rest| rest.trim())
}

fn label_value(line: &str) -> Option<String> {
    let raw = label_value_raw(line)?;
    let value = match serde_yaml::from_str::<serde_yaml::Value>(raw).ok()? {
        serde_yaml::Value::String(text) => text,
        serde_yaml::Value::Number(number) => number.to_string(),
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    normalize_label(&value)
}
