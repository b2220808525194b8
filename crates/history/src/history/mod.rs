// Version store service: save, list, get, delete, clear, prune.
//
// Mutating operations run under the per-document lock; read paths never lock
// and swallow failures (logged) so a broken history never blocks the editor.

pub mod restore;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use quire_common::frontmatter::{
    self, extract_label, generate_preview, inject_label, normalize_label, strip_label,
};
use quire_common::id::{parse_id, VersionIdGenerator};
use quire_common::types::{Version, VersionEntry, VersionManifest};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::lock::LockManager;
use crate::store::prune::PruneReport;
use crate::store::DocumentStore;

pub use restore::{RestoreOptions, RestoreOutcome, DEFAULT_SAFETY_LABEL};

/// Identifies one document's history under a project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub root: &'a Path,
    pub collection: &'a str,
    pub document: &'a str,
}

impl<'a> DocumentRef<'a> {
    pub fn new(root: &'a Path, collection: &'a str, document: &'a str) -> Self {
        Self { root, collection, document }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Trimmed; blank means unlabeled.
    pub label: Option<String>,
    /// Return the newest entry instead of saving when its content matches.
    pub skip_if_identical: bool,
}

impl SaveOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), skip_if_identical: false }
    }
}

pub struct VersionHistory {
    locks: Arc<LockManager>,
    ids: VersionIdGenerator,
}

impl VersionHistory {
    pub fn new(locks: Arc<LockManager>) -> Self {
        Self { locks, ids: VersionIdGenerator::new() }
    }

    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    /// Snapshot `content`. `Ok(None)` when history is disabled.
    pub async fn save(
        &self,
        doc: DocumentRef<'_>,
        content: &str,
        config: &HistoryConfig,
        options: &SaveOptions,
    ) -> Result<Option<VersionEntry>, HistoryError> {
        if !config.enabled {
            return Ok(None);
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document)?;
        let entry = self
            .locks
            .with_lock(store.dir(), || self.save_locked(&store, content, config, options))
            .await??;
        Ok(Some(entry))
    }

    async fn save_locked(
        &self,
        store: &DocumentStore,
        content: &str,
        config: &HistoryConfig,
        options: &SaveOptions,
    ) -> Result<VersionEntry, HistoryError> {
        store.ensure_initialized().await?;
        let mut manifest = store.load_manifest_for_write().await?;

        if options.skip_if_identical {
            if let Some(latest) = manifest.latest() {
                let stored = store.read_version(&latest.id).await?;
                if stored.as_deref().map(strip_label).as_deref() == Some(content) {
                    debug!(
                        collection = store.collection_id(),
                        doc_id = store.document_id(),
                        version_id = %latest.id,
                        "content unchanged, skipping save"
                    );
                    return Ok(latest.clone());
                }
            }
        }

        let stamp = self.ids.next();
        let label = options.label.as_deref().and_then(normalize_label);
        let stored = match &label {
            Some(label) => inject_label(content, label),
            None => content.to_string(),
        };
        let size = store.write_version(&stamp.id, &stored).await?;

        let entry = VersionEntry {
            id: stamp.id,
            timestamp: stamp.timestamp,
            preview: generate_preview(content),
            size,
            label,
        };
        manifest.versions.insert(0, entry.clone());
        manifest.updated_at = Utc::now();
        store.write_manifest(&manifest).await?;
        info!(
            collection = store.collection_id(),
            doc_id = store.document_id(),
            version_id = %entry.id,
            size = entry.size,
            labeled = entry.is_labeled(),
            "saved version"
        );

        if let Err(error) = store.apply_prune(&mut manifest, config.max_versions).await {
            warn!(
                collection = store.collection_id(),
                doc_id = store.document_id(),
                error = %format!("{error:#}"),
                "prune after save failed"
            );
        }
        Ok(entry)
    }

    /// Every version, newest first. Empty on any failure.
    pub async fn list(&self, doc: DocumentRef<'_>, config: &HistoryConfig) -> Vec<VersionEntry> {
        if !config.enabled {
            return Vec::new();
        }
        let store = match DocumentStore::open(doc.root, config, doc.collection, doc.document) {
            Ok(store) => store,
            Err(error) => {
                warn!(
                    collection = doc.collection,
                    doc_id = doc.document,
                    error = %error,
                    "cannot list history"
                );
                return Vec::new();
            }
        };
        match store.load_manifest_for_read().await {
            Ok(manifest) => manifest.versions,
            Err(error) => {
                warn!(
                    collection = store.collection_id(),
                    doc_id = store.document_id(),
                    error = %format!("{error:#}"),
                    "failed to list history"
                );
                Vec::new()
            }
        }
    }

    /// Full content of one version, or `None` if it does not exist.
    pub async fn get(
        &self,
        doc: DocumentRef<'_>,
        version_id: &str,
        config: &HistoryConfig,
    ) -> Option<Version> {
        if !config.enabled {
            return None;
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document).ok()?;
        let fallback_timestamp = parse_id(version_id)?;

        let raw = match store.read_version(version_id).await {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(
                    collection = store.collection_id(),
                    doc_id = store.document_id(),
                    version_id,
                    error = %format!("{error:#}"),
                    "failed to read version"
                );
                return None;
            }
        };

        let embedded_label = extract_label(&raw);
        let content = strip_label(&raw);
        let (header, body) = match frontmatter::parse(&content) {
            Ok(parsed) => (parsed.data, parsed.body),
            Err(error) => {
                debug!(version_id, error = %error, "version has a malformed header block");
                (Default::default(), content.clone())
            }
        };

        let listed = match store.read_manifest().await {
            Some(manifest) => manifest.find(version_id).cloned(),
            None => None,
        };
        let entry = match listed {
            Some(mut entry) => {
                entry.label = entry.label.or(embedded_label);
                entry
            }
            None => VersionEntry {
                id: version_id.to_string(),
                timestamp: fallback_timestamp,
                preview: generate_preview(&content),
                size: raw.len() as u64,
                label: embedded_label,
            },
        };

        Some(Version { entry, content, frontmatter: header, body })
    }

    /// Remove one version. `VersionNotFound` if its file does not exist.
    pub async fn delete(
        &self,
        doc: DocumentRef<'_>,
        version_id: &str,
        config: &HistoryConfig,
    ) -> Result<(), HistoryError> {
        if !config.enabled {
            return Ok(());
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document)?;
        if parse_id(version_id).is_none() {
            return Err(HistoryError::not_found(store.collection_id(), store.document_id(), version_id));
        }

        self.locks
            .with_lock(store.dir(), || async {
                if !store.remove_version(version_id).await? {
                    return Err(HistoryError::not_found(
                        store.collection_id(),
                        store.document_id(),
                        version_id,
                    ));
                }
                let mut manifest = store.load_manifest_for_write().await?;
                manifest.versions.retain(|entry| entry.id != version_id);
                manifest.updated_at = Utc::now();
                store.write_manifest(&manifest).await?;
                info!(
                    collection = store.collection_id(),
                    doc_id = store.document_id(),
                    version_id,
                    "deleted version"
                );
                Ok::<_, HistoryError>(())
            })
            .await?
    }

    /// Delete every snapshot and reset the manifest. Returns files removed.
    pub async fn clear(
        &self,
        doc: DocumentRef<'_>,
        config: &HistoryConfig,
    ) -> Result<usize, HistoryError> {
        if !config.enabled {
            return Ok(0);
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document)?;

        self.locks
            .with_lock(store.dir(), || async {
                let mut removed = 0usize;
                for id in store.list_version_ids().await? {
                    if store.remove_version(&id).await? {
                        removed += 1;
                    }
                }
                if removed == 0 && !fs::try_exists(store.dir()).await.unwrap_or(false) {
                    return Ok(0);
                }
                store
                    .write_manifest(&VersionManifest::empty(store.collection_id(), store.document_id()))
                    .await?;
                info!(
                    collection = store.collection_id(),
                    doc_id = store.document_id(),
                    removed,
                    "cleared version history"
                );
                Ok::<_, HistoryError>(removed)
            })
            .await?
    }

    /// Apply retention now instead of waiting for the next save.
    pub async fn prune(
        &self,
        doc: DocumentRef<'_>,
        config: &HistoryConfig,
    ) -> Result<PruneReport, HistoryError> {
        if !config.enabled {
            return Ok(PruneReport::default());
        }
        let store = DocumentStore::open(doc.root, config, doc.collection, doc.document)?;

        self.locks
            .with_lock(store.dir(), || async {
                if !fs::try_exists(store.dir()).await.unwrap_or(false) {
                    return Ok(PruneReport::default());
                }
                let mut manifest = store.load_manifest_for_write().await?;
                Ok::<_, HistoryError>(store.apply_prune(&mut manifest, config.max_versions).await?)
            })
            .await?
    }
}
