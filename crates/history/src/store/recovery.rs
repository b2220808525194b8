// Rebuild manifest entries from the snapshot files that survive on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quire_common::frontmatter::{extract_label, generate_preview, strip_label};
use quire_common::id::{id_from_file_name, parse_id};
use quire_common::types::{sort_newest_first, VersionEntry};
use tokio::fs;
use tracing::{debug, warn};

use super::DocumentStore;

impl DocumentStore {
    /// One entry per readable `<id>.md` file, newest first. Files whose name
    /// is not a valid id, or whose content is not UTF-8, are skipped.
    pub async fn scan_versions(&self) -> Result<Vec<VersionEntry>> {
        let mut entries = Vec::new();
        for path in read_files_sorted(self.dir()).await? {
            let Some(id) = path.file_name().and_then(|name| name.to_str()).and_then(id_from_file_name)
            else {
                continue;
            };
            let Some(timestamp) = parse_id(id) else {
                continue;
            };

            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "skipping unreadable version file");
                    continue;
                }
            };

            entries.push(VersionEntry {
                id: id.to_string(),
                timestamp,
                preview: generate_preview(&strip_label(&content)),
                size: content.len() as u64,
                label: extract_label(&content),
            });
        }

        sort_newest_first(&mut entries);
        debug!(
            collection = self.collection_id(),
            doc_id = self.document_id(),
            found = entries.len(),
            "scanned version files"
        );
        Ok(entries)
    }

    /// Ids of every `<id>.md` file, going by name alone. Contents are never
    /// read, so undecodable snapshots are still listed.
    pub async fn list_version_ids(&self) -> Result<Vec<String>> {
        let ids = read_files_sorted(self.dir())
            .await?
            .iter()
            .filter_map(|path| path.file_name()?.to_str().and_then(id_from_file_name))
            .map(str::to_string)
            .collect();
        Ok(ids)
    }
}

/// Regular files in `dir`, sorted by path. A missing directory is empty.
async fn read_files_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read directory `{}`", dir.display()))
        }
    };

    let mut files = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .with_context(|| format!("failed to iterate directory `{}`", dir.display()))?
    {
        let is_file = entry.file_type().await.map(|kind| kind.is_file()).unwrap_or(false);
        if is_file {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
