pub mod manifest;
pub mod prune;
pub mod recovery;
pub mod snapshot;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use quire_common::id::version_file_name;
use quire_common::path::normalize_segment;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::HistoryConfig;
use crate::error::HistoryError;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";
const GITIGNORE_CONTENTS: &str = "*\n";

/// On-disk location of one document's history:
/// `<storage_root>/<collection>/<doc>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStore {
    storage_root: PathBuf,
    dir: PathBuf,
    collection_id: String,
    document_id: String,
}

impl DocumentStore {
    /// Validate both ids as single path segments and resolve the directory.
    pub fn open(
        project_root: &Path,
        config: &HistoryConfig,
        collection: &str,
        document: &str,
    ) -> Result<Self, HistoryError> {
        let collection_id = normalize_segment(collection).map_err(|source| {
            HistoryError::InvalidIdentifier { what: "collection id", value: collection.to_string(), source }
        })?;
        let document_id = normalize_segment(document).map_err(|source| {
            HistoryError::InvalidIdentifier { what: "document id", value: document.to_string(), source }
        })?;

        let storage_root = config.storage_root(project_root);
        let dir = storage_root.join(&collection_id).join(&document_id);
        Ok(Self { storage_root, dir, collection_id, document_id })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    pub fn version_path(&self, id: &str) -> PathBuf {
        self.dir.join(version_file_name(id))
    }

    /// Create the storage root with its `.gitignore` marker, then the
    /// document directory.
    pub async fn ensure_initialized(&self) -> Result<()> {
        fs::create_dir_all(&self.storage_root).await.with_context(|| {
            format!("failed to create history root `{}`", self.storage_root.display())
        })?;

        let marker = self.storage_root.join(GITIGNORE_FILE_NAME);
        if !fs::try_exists(&marker).await.unwrap_or(false) {
            fs::write(&marker, GITIGNORE_CONTENTS)
                .await
                .with_context(|| format!("failed to write `{}`", marker.display()))?;
            debug!(path = %marker.display(), "created history .gitignore marker");
        }

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create history directory `{}`", self.dir.display()))
    }
}

/// Write `contents` to a sibling temp file, fsync, then rename over `target`.
/// Readers see either the old file or the new one.
pub(crate) async fn atomic_write(target: &Path, contents: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .with_context(|| format!("`{}` has no parent directory", target.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("failed to create directory `{}`", parent.display()))?;

    let tmp_path = temp_path_for(target);
    let mut file = fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to open temp file `{}`", tmp_path.display()))?;
    file.write_all(contents)
        .await
        .with_context(|| format!("failed to write temp file `{}`", tmp_path.display()))?;
    file.sync_data().await.context("failed to fsync temp file")?;
    drop(file);

    if let Err(error) = fs::rename(&tmp_path, target).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(error).with_context(|| {
            format!(
                "failed to atomically move `{}` to `{}`",
                tmp_path.display(),
                target.display()
            )
        });
    }
    Ok(())
}

fn temp_path_for(target: &Path) -> PathBuf {
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let name = target.file_name().and_then(|name| name.to_str()).unwrap_or("history");
    target.with_file_name(format!(".{name}.tmp.{nonce}"))
}
