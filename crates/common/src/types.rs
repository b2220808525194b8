// Core domain types shared across all quire crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one stored snapshot of a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Sortable id, also the snapshot file stem.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// First 100 characters of the body, header block stripped.
    pub preview: String,
    /// Bytes of the stored snapshot file.
    pub size: u64,
    /// Present only for manually named snapshots; these are never pruned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl VersionEntry {
    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }
}

/// Per-document index of every known snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub document_id: String,
    pub collection_id: String,
    pub versions: Vec<VersionEntry>,
    pub updated_at: DateTime<Utc>,
}

impl VersionManifest {
    pub fn empty(collection_id: &str, document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            collection_id: collection_id.to_string(),
            versions: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Most recent entry by timestamp, regardless of storage order.
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.iter().max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
    }

    pub fn find(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| entry.id == id)
    }

    /// Sort entries newest first. Ids break timestamp ties.
    pub fn sort_newest_first(&mut self) {
        sort_newest_first(&mut self.versions);
    }

    pub fn unlabeled_count(&self) -> usize {
        self.versions.iter().filter(|entry| !entry.is_labeled()).count()
    }
}

pub fn sort_newest_first(entries: &mut [VersionEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
}

/// A snapshot with its full content, rebuilt from disk on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(flatten)]
    pub entry: VersionEntry,
    /// Stored content with the reserved label key removed.
    pub content: String,
    /// Parsed header block; empty when absent or malformed.
    pub frontmatter: BTreeMap<String, serde_json::Value>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: &str, minute: i64, label: Option<&str>) -> VersionEntry {
        VersionEntry {
            id: id.to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap(),
            preview: String::new(),
            size: 0,
            label: label.map(str::to_string),
        }
    }

    #[test]
    fn manifest_serializes_camel_case_and_omits_missing_label() {
        let mut manifest = VersionManifest::empty("posts", "hello");
        manifest.versions.push(entry("a", 0, None));
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["documentId"], "hello");
        assert_eq!(json["collectionId"], "posts");
        assert!(json.get("updatedAt").is_some());
        assert!(json["versions"][0].get("label").is_none());
    }

    #[test]
    fn manifest_rejects_missing_required_fields() {
        let raw = r#"{"documentId":"hello","versions":[]}"#;
        assert!(serde_json::from_str::<VersionManifest>(raw).is_err());
    }

    #[test]
    fn latest_ignores_storage_order() {
        let mut manifest = VersionManifest::empty("posts", "hello");
        manifest.versions =
            vec![entry("b", 5, None), entry("c", 9, Some("named")), entry("a", 1, None)];
        assert_eq!(manifest.latest().unwrap().id, "c");
        assert_eq!(manifest.unlabeled_count(), 2);
    }

    #[test]
    fn sort_newest_first_orders_by_timestamp_descending() {
        let mut manifest = VersionManifest::empty("posts", "hello");
        manifest.versions = vec![entry("a", 1, None), entry("c", 9, None), entry("b", 5, None)];
        manifest.sort_newest_first();
        let ids: Vec<_> = manifest.versions.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn version_flattens_entry_fields() {
        let version = Version {
            entry: entry("a", 0, Some("draft")),
            content: "body".into(),
            frontmatter: BTreeMap::new(),
            body: "body".into(),
        };
        let json = serde_json::to_value(&version).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["label"], "draft");
        assert_eq!(json["body"], "body");
    }
}
