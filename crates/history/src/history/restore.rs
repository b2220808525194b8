// Restore a stored version over the live document, snapshotting the live
// content first so the restore itself can be undone.

use std::borrow::Cow;
use std::path::Path;

use quire_common::types::VersionEntry;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use super::{DocumentRef, SaveOptions, VersionHistory};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::store::{atomic_write, DocumentStore};

pub const DEFAULT_SAFETY_LABEL: &str = "Before restore";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Label for the safety snapshot; defaults to "Before restore".
    pub safety_label: Option<String>,
    pub skip_safety: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    /// Content written to the live document. `None` when history is disabled.
    pub content: Option<String>,
    pub safety_snapshot: Option<VersionEntry>,
}

impl VersionHistory {
    /// Overwrite `live_path` with the content of `version_id`.
    ///
    /// A relative `live_path` resolves against the project root. The live
    /// document is left untouched when the version does not exist.
    pub async fn restore(
        &self,
        doc: DocumentRef<'_>,
        version_id: &str,
        live_path: &Path,
        config: &HistoryConfig,
        options: &RestoreOptions,
    ) -> Result<RestoreOutcome, HistoryError> {
        if !config.enabled {
            return Ok(RestoreOutcome::default());
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document)?;
        let target = self.get(doc, version_id, config).await.ok_or_else(|| {
            HistoryError::not_found(store.collection_id(), store.document_id(), version_id)
        })?;

        let live_path: Cow<'_, Path> = if live_path.is_absolute() {
            Cow::Borrowed(live_path)
        } else {
            Cow::Owned(doc.root.join(live_path))
        };

        let safety_snapshot = if options.skip_safety {
            None
        } else {
            self.snapshot_live(doc, &live_path, config, options).await
        };

        atomic_write(&live_path, target.content.as_bytes()).await?;
        info!(
            collection = store.collection_id(),
            doc_id = store.document_id(),
            version_id,
            path = %live_path.display(),
            safety_snapshot = safety_snapshot.as_ref().map(|entry| entry.id.as_str()),
            "restored version"
        );

        Ok(RestoreOutcome { content: Some(target.content), safety_snapshot })
    }

    async fn snapshot_live(
        &self,
        doc: DocumentRef<'_>,
        live_path: &Path,
        config: &HistoryConfig,
        options: &RestoreOptions,
    ) -> Option<VersionEntry> {
        let live = match fs::read_to_string(live_path).await {
            Ok(live) => live,
            Err(error) => {
                warn!(
                    path = %live_path.display(),
                    error = %error,
                    "cannot read live document, restoring without safety snapshot"
                );
                return None;
            }
        };

        let label = options.safety_label.clone().unwrap_or_else(|| DEFAULT_SAFETY_LABEL.to_string());
        match self.save(doc, &live, config, &SaveOptions::labeled(label)).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(
                    path = %live_path.display(),
                    error = %error,
                    "safety snapshot failed, restoring anyway"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockManager, LockOptions};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn history() -> VersionHistory {
        VersionHistory::new(Arc::new(LockManager::new(LockOptions::default())))
    }

    #[tokio::test]
    async fn relative_live_path_resolves_against_root() {
        let tmp = tempdir().unwrap();
        let doc = DocumentRef::new(tmp.path(), "posts", "hello");
        let config = HistoryConfig::default();
        let history = history();
        let old = history.save(doc, "old text", &config, &SaveOptions::labeled("v1")).await.unwrap().unwrap();

        let outcome = history
            .restore(doc, &old.id, Path::new("content/posts/hello.md"), &config, &RestoreOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.content.as_deref(), Some("old text"));
        assert_eq!(outcome.safety_snapshot, None);
        let written = std::fs::read_to_string(tmp.path().join("content/posts/hello.md")).unwrap();
        assert_eq!(written, "old text");
    }

    #[tokio::test]
    async fn custom_safety_label_is_used() {
        let tmp = tempdir().unwrap();
        let doc = DocumentRef::new(tmp.path(), "posts", "hello");
        let config = HistoryConfig::default();
        let history = history();
        let live = tmp.path().join("hello.md");
        std::fs::write(&live, "current").unwrap();
        let old = history.save(doc, "old", &config, &SaveOptions::default()).await.unwrap().unwrap();

        let options = RestoreOptions { safety_label: Some("pre-rollback".into()), skip_safety: false };
        let outcome = history.restore(doc, &old.id, &live, &config, &options).await.unwrap();

        let safety = outcome.safety_snapshot.expect("safety snapshot");
        assert_eq!(safety.label.as_deref(), Some("pre-rollback"));
        let stored = history.get(doc, &safety.id, &config).await.unwrap();
        assert_eq!(stored.content, "current");
    }

    #[tokio::test]
    async fn disabled_restore_is_a_no_op() {
        let tmp = tempdir().unwrap();
        let doc = DocumentRef::new(tmp.path(), "posts", "hello");
        let config = HistoryConfig { enabled: false, ..HistoryConfig::default() };
        let live = tmp.path().join("hello.md");
        std::fs::write(&live, "current").unwrap();

        let outcome = history()
            .restore(doc, "2024-01-15T10-30-45.000000Z-abcd", &live, &config, &RestoreOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, RestoreOutcome::default());
        assert_eq!(std::fs::read_to_string(&live).unwrap(), "current");
    }
}
