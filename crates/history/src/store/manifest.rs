// Per-document `manifest.json`: read with validation, atomic write, and
// reconstruction from snapshot files when the manifest is missing or corrupt.

use std::io::ErrorKind;

use anyhow::{Context, Result};
use chrono::Utc;
use quire_common::id::parse_id;
use quire_common::types::VersionManifest;
use tokio::fs;
use tracing::{debug, info, warn};

use super::{atomic_write, DocumentStore};

impl DocumentStore {
    /// Load the manifest, or `None` if it is missing or needs recovery.
    pub async fn read_manifest(&self) -> Option<VersionManifest> {
        let path = self.manifest_path();
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no manifest on disk");
                return None;
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to read manifest");
                return None;
            }
        };

        let manifest: VersionManifest = match serde_json::from_slice(&raw) {
            Ok(manifest) => manifest,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "manifest is not valid, needs recovery");
                return None;
            }
        };

        if manifest.collection_id != self.collection_id()
            || manifest.document_id != self.document_id()
        {
            warn!(
                path = %path.display(),
                found_collection = %manifest.collection_id,
                found_doc = %manifest.document_id,
                "manifest belongs to another document, needs recovery"
            );
            return None;
        }

        if let Some(bad) = manifest.versions.iter().find(|entry| parse_id(&entry.id).is_none()) {
            warn!(path = %path.display(), version_id = %bad.id, "manifest holds an invalid version id, needs recovery");
            return None;
        }

        Some(manifest)
    }

    /// Persist `manifest` as pretty JSON via temp file and rename.
    pub async fn write_manifest(&self, manifest: &VersionManifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest).context("failed to serialize manifest")?;
        atomic_write(&self.manifest_path(), &json).await.context("failed to write manifest")
    }

    /// Build a manifest from the snapshot files without persisting it.
    pub async fn rebuild_manifest(&self) -> Result<VersionManifest> {
        let mut manifest = VersionManifest::empty(self.collection_id(), self.document_id());
        manifest.versions = self.scan_versions().await?;
        Ok(manifest)
    }

    /// Rebuild from the snapshot files and persist the result.
    pub async fn recover_manifest(&self) -> Result<VersionManifest> {
        let manifest = self.rebuild_manifest().await?;
        self.write_manifest(&manifest).await?;
        info!(
            collection = self.collection_id(),
            doc_id = self.document_id(),
            versions = manifest.versions.len(),
            "recovered version manifest from snapshot files"
        );
        Ok(manifest)
    }

    /// Manifest for read paths: stored one if valid, else rebuilt in memory.
    pub async fn load_manifest_for_read(&self) -> Result<VersionManifest> {
        let mut manifest = match self.read_manifest().await {
            Some(manifest) => manifest,
            None => self.rebuild_manifest().await?,
        };
        manifest.sort_newest_first();
        Ok(manifest)
    }

    /// Manifest for write paths: read or recover, then drop entries whose
    /// snapshot file has vanished. Caller must hold the document lock.
    pub async fn load_manifest_for_write(&self) -> Result<VersionManifest> {
        let mut manifest = match self.read_manifest().await {
            Some(manifest) => manifest,
            None => self.recover_manifest().await?,
        };

        let before = manifest.versions.len();
        let mut kept = Vec::with_capacity(before);
        for entry in manifest.versions.drain(..) {
            if self.version_exists(&entry.id).await {
                kept.push(entry);
            } else {
                warn!(
                    collection = self.collection_id(),
                    doc_id = self.document_id(),
                    version_id = %entry.id,
                    "dropping manifest entry without snapshot file"
                );
            }
        }
        manifest.versions = kept;
        manifest.sort_newest_first();

        if manifest.versions.len() != before {
            manifest.updated_at = Utc::now();
            self.write_manifest(&manifest).await?;
        }
        Ok(manifest)
    }
}
