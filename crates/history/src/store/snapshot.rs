// Version snapshot files: `<doc dir>/<id>.md`, stored content verbatim
// (label embedded in the header block when present).

use std::io::ErrorKind;

use anyhow::{Context, Result};
use tokio::fs;

use super::{atomic_write, DocumentStore};

impl DocumentStore {
    /// Atomically write a snapshot; returns the stored size in bytes.
    pub async fn write_version(&self, id: &str, content: &str) -> Result<u64> {
        let path = self.version_path(id);
        atomic_write(&path, content.as_bytes())
            .await
            .with_context(|| format!("failed to write version `{id}`"))?;
        Ok(content.len() as u64)
    }

    /// `None` when the file does not exist.
    pub async fn read_version(&self, id: &str) -> Result<Option<String>> {
        let path = self.version_path(id);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("failed to read version `{}`", path.display()))
            }
        }
    }

    /// Remove a snapshot. Returns whether a file was actually deleted.
    pub async fn remove_version(&self, id: &str) -> Result<bool> {
        let path = self.version_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => {
                Err(error).with_context(|| format!("failed to remove version `{}`", path.display()))
            }
        }
    }

    pub async fn version_exists(&self, id: &str) -> bool {
        fs::try_exists(self.version_path(id)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use quire_common::id::generate_id;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_read_remove_cycle() {
        let tmp = tempdir().unwrap();
        let store =
            DocumentStore::open(tmp.path(), &HistoryConfig::default(), "posts", "hello").unwrap();
        let id = generate_id().id;

        let size = store.write_version(&id, "héllo").await.unwrap();
        assert_eq!(size, 6);
        assert!(store.version_exists(&id).await);
        assert_eq!(store.read_version(&id).await.unwrap().as_deref(), Some("héllo"));

        assert!(store.remove_version(&id).await.unwrap());
        assert!(!store.remove_version(&id).await.unwrap());
        assert_eq!(store.read_version(&id).await.unwrap(), None);
    }
}
