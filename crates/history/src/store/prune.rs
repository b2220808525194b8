// Retention: labeled versions are kept forever; unlabeled versions beyond the
// newest `max_versions` are evicted, oldest first.

use anyhow::Result;
use chrono::Utc;
use quire_common::types::{sort_newest_first, VersionEntry, VersionManifest};
use serde::Serialize;
use tracing::{debug, warn};

use super::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrunePlan {
    /// Newest first.
    pub keep: Vec<VersionEntry>,
    /// Oldest first.
    pub evict: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub removed: Vec<String>,
    pub remaining: usize,
}

pub fn plan(entries: &[VersionEntry], max_versions: usize) -> PrunePlan {
    let mut sorted = entries.to_vec();
    sort_newest_first(&mut sorted);

    let mut unlabeled_seen = 0usize;
    let mut keep = Vec::with_capacity(sorted.len());
    let mut evict = Vec::new();
    for entry in sorted {
        if entry.is_labeled() {
            keep.push(entry);
            continue;
        }
        unlabeled_seen += 1;
        if unlabeled_seen <= max_versions {
            keep.push(entry);
        } else {
            evict.push(entry);
        }
    }
    evict.reverse();
    PrunePlan { keep, evict }
}

impl DocumentStore {
    /// Delete evicted snapshot files and persist the surviving manifest.
    /// Caller must hold the document lock.
    pub async fn apply_prune(
        &self,
        manifest: &mut VersionManifest,
        max_versions: usize,
    ) -> Result<PruneReport> {
        let PrunePlan { mut keep, evict } = plan(&manifest.versions, max_versions);
        if evict.is_empty() {
            return Ok(PruneReport { removed: Vec::new(), remaining: keep.len() });
        }

        let mut removed = Vec::with_capacity(evict.len());
        for entry in evict {
            match self.remove_version(&entry.id).await {
                Ok(_) => {
                    debug!(
                        collection = self.collection_id(),
                        doc_id = self.document_id(),
                        version_id = %entry.id,
                        "pruned version"
                    );
                    removed.push(entry.id);
                }
                Err(error) => {
                    // The file is still there, so the entry stays listed.
                    warn!(version_id = %entry.id, error = %format!("{error:#}"), "failed to prune version");
                    keep.push(entry);
                }
            }
        }

        sort_newest_first(&mut keep);
        manifest.versions = keep;
        manifest.updated_at = Utc::now();
        self.write_manifest(manifest).await?;

        Ok(PruneReport { removed, remaining: manifest.versions.len() })
    }
}
