//! Blob storage for file blocks.
//!
//! Each session gets its own directory under the upload root; file blocks
//! are stored under a server-chosen name (`file_<block_id><ext>`) while the
//! ledger keeps the original filename. Payloads are opaque bytes -- they
//! arrive encrypted and are stored and served verbatim.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prepare the upload root, clearing anything left over from a previous
    /// run. Sessions are memory-resident, so orphaned blobs from before a
    /// restart can never be referenced again.
    pub async fn init(&self) -> std::io::Result<()> {
        if tokio::fs::try_exists(&self.root).await? {
            let mut entries = tokio::fs::read_dir(&self.root).await?;
            let mut purged = 0usize;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    tokio::fs::remove_dir_all(&path).await?;
                } else {
                    tokio::fs::remove_file(&path).await?;
                }
                purged += 1;
            }
            if purged > 0 {
                tracing::info!(purged, root = %self.root.display(), "Purged stale upload data");
            }
        } else {
            tokio::fs::create_dir_all(&self.root).await?;
        }
        Ok(())
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    /// Absolute path of a stored blob; used for streamed downloads.
    pub fn blob_path(&self, session_id: &str, stored_name: &str) -> PathBuf {
        self.session_dir(session_id).join(stored_name)
    }

    /// Persist a blob under the session's directory.
    pub async fn save(
        &self,
        session_id: &str,
        stored_name: &str,
        data: &[u8],
    ) -> Result<(), CoreError> {
        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("creating session dir: {e}")))?;

        let path = dir.join(stored_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| CoreError::Internal(format!("writing blob: {e}")))?;

        tracing::debug!(
            session_id = %session_id,
            stored_name = %stored_name,
            bytes = data.len(),
            "Blob stored"
        );
        Ok(())
    }

    /// Delete one blob. Missing files are fine -- deletion is idempotent.
    pub async fn delete(&self, session_id: &str, stored_name: &str) -> Result<(), CoreError> {
        let path = self.blob_path(session_id, stored_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!("removing blob: {e}"))),
        }
    }

    /// Remove a session's whole directory. Failures are surfaced so the
    /// sweeper can log and retry on its next cycle; session removal from
    /// the registry never waits on this.
    pub async fn remove_session(&self, session_id: &str) -> Result<(), CoreError> {
        let dir = self.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!("removing session dir: {e}"))),
        }
    }
}
